use anyhow::Result;
use hydro_grid::{
    BranchEnd, BranchId, Discretization, DiscretizationError, InMemoryNetwork, NetworkLocation,
    SegmentGeneration,
};

fn loc(branch: BranchId, chainage: f64) -> NetworkLocation {
    NetworkLocation::new(branch, chainage)
}

#[test]
fn test_compartment_switch_drops_extra_anchor_in_target() -> Result<()> {
    let mut network = InMemoryNetwork::new();
    let a = network.add_node("A");
    let b = network.add_node("B");
    let (manhole, compartments) = network.add_manhole("M", &["c1", "c2"]);
    let (c1, c2) = (compartments[0], compartments[1]);
    let s1 = network.add_sewer_connection("s1", a, manhole, 10.0, None, Some(c1))?;
    let s2 = network.add_sewer_connection("s2", b, manhole, 10.0, None, Some(c2))?;
    let mut discretization = Discretization::with_network(network);

    discretization.add_missing_locations_for_sewer_connections(&[s1, s2])?;
    assert_eq!(
        discretization.locations(),
        &[loc(s1, 0.0), loc(s1, 10.0), loc(s2, 0.0), loc(s2, 10.0)]
    );
    assert_eq!(discretization.location_for_branch_node(s2, BranchEnd::End), Some(loc(s2, 10.0)));
    assert_eq!(discretization.location_for_branch_node(s1, BranchEnd::Begin), Some(loc(s1, 0.0)));

    let previous = discretization
        .network_mut()
        .map(|n| n.switch_compartment(s2, BranchEnd::End, Some(c1)))
        .transpose()?
        .flatten();
    assert_eq!(previous, Some(c2));

    discretization.handle_compartment_switch(previous, Some(c1))?;

    assert_eq!(
        discretization.locations(),
        &[loc(s1, 0.0), loc(s1, 10.0), loc(s2, 0.0)]
    );
    assert_eq!(discretization.locations_for_compartment(c1), vec![loc(s1, 10.0)]);
    assert!(discretization.locations_for_compartment(c2).is_empty());
    Ok(())
}

#[test]
fn test_compartment_switch_reanchors_vacated_compartment() -> Result<()> {
    let mut network = InMemoryNetwork::new();
    let a = network.add_node("A");
    let b = network.add_node("B");
    let (manhole, compartments) = network.add_manhole("M", &["c1", "c2"]);
    let (c1, c2) = (compartments[0], compartments[1]);
    let s1 = network.add_sewer_connection("s1", a, manhole, 10.0, None, Some(c1))?;
    let s3 = network.add_sewer_connection("s3", manhole, b, 15.0, Some(c2), None)?;
    let s4 = network.add_sewer_connection("s4", a, manhole, 12.0, None, Some(c2))?;
    let mut discretization = Discretization::with_network(network);

    discretization.add_missing_locations_for_sewer_connections(&[s1, s3, s4])?;
    assert_eq!(
        discretization.locations(),
        &[loc(s1, 0.0), loc(s1, 10.0), loc(s3, 0.0), loc(s3, 15.0)]
    );
    assert_eq!(discretization.missing_location_for_compartment(c2), None);

    if let Some(network) = discretization.network_mut() {
        network.switch_compartment(s3, BranchEnd::Begin, Some(c1))?;
    }
    assert_eq!(discretization.missing_location_for_compartment(c2), Some(loc(s4, 12.0)));

    discretization.handle_compartment_switch(Some(c2), Some(c1))?;

    assert_eq!(
        discretization.locations(),
        &[loc(s1, 0.0), loc(s1, 10.0), loc(s3, 15.0), loc(s4, 12.0)]
    );
    assert_eq!(discretization.locations_for_compartment(c1).len(), 1);
    assert_eq!(discretization.locations_for_compartment(c2).len(), 1);
    Ok(())
}

#[test]
fn test_compartment_switch_rejects_unknown_compartment() -> Result<()> {
    let mut network = InMemoryNetwork::new();
    let (_, compartments) = network.add_manhole("M", &["c1"]);
    let mut discretization = Discretization::with_network(network);

    let unknown = hydro_grid::CompartmentId(compartments[0].0 + 100);
    let err = discretization.handle_compartment_switch(Some(unknown), None).unwrap_err();
    assert!(matches!(err, DiscretizationError::UnknownCompartment { .. }));
    Ok(())
}

#[test]
fn test_removed_sewer_connection_hands_anchor_to_sibling() -> Result<()> {
    let mut network = InMemoryNetwork::new();
    let a = network.add_node("A");
    let b = network.add_node("B");
    let (manhole, compartments) = network.add_manhole("M", &["c1"]);
    let s1 = network.add_sewer_connection("s1", a, manhole, 10.0, None, Some(compartments[0]))?;
    let s2 = network.add_sewer_connection("s2", b, manhole, 8.0, None, Some(compartments[0]))?;
    let mut discretization = Discretization::with_network(network);

    discretization.add_missing_locations_for_sewer_connections(&[s1, s2])?;
    assert_eq!(discretization.locations(), &[loc(s1, 0.0), loc(s1, 10.0), loc(s2, 0.0)]);

    discretization.replace_points_for_removed_branch(&[s1])?;

    assert_eq!(discretization.locations(), &[loc(s2, 0.0), loc(s2, 8.0)]);
    assert_eq!(discretization.locations_at_node(manhole), vec![loc(s2, 8.0)]);
    Ok(())
}

#[test]
fn test_zero_length_connection_gets_single_anchor() -> Result<()> {
    let mut network = InMemoryNetwork::new();
    let a = network.add_node("A");
    let b = network.add_node("B");
    let weir = network.add_sewer_connection("weir", a, b, 0.0, None, None)?;
    let mut discretization = Discretization::with_network(network);

    discretization.add_missing_locations_for_sewer_connections(&[weir])?;

    assert_eq!(discretization.locations(), &[loc(weir, 0.0)]);
    assert_eq!(discretization.generate_sewer_connection_locations(), vec![loc(weir, 0.0)]);
    Ok(())
}

#[test]
fn test_clear_rural_locations_keeps_sewer_anchors() -> Result<()> {
    let mut network = InMemoryNetwork::new();
    let a = network.add_node("A");
    let b = network.add_node("B");
    let (manhole, compartments) = network.add_manhole("M", &["c1"]);
    let channel = network.add_channel("ditch", a, b, 100.0)?;
    let sewer = network.add_sewer_connection("outfall", b, manhole, 10.0, None, Some(compartments[0]))?;
    let mut discretization = Discretization::with_network(network);

    discretization.update_network_locations(
        vec![
            loc(channel, 0.0),
            loc(channel, 50.0),
            loc(channel, 100.0),
            loc(sewer, 5.0),
            loc(sewer, 10.0),
        ],
        false,
    )?;
    discretization.toggle_fixed_point(&loc(channel, 50.0))?;
    discretization.toggle_fixed_point(&loc(sewer, 10.0))?;

    discretization.clear_rural_locations()?;

    assert_eq!(discretization.locations(), &[loc(sewer, 0.0), loc(sewer, 10.0)]);
    assert_eq!(discretization.fixed_mask(), &[false, true]);
    assert_eq!(discretization.segment_generation(), SegmentGeneration::BetweenLocations);
    assert_eq!(discretization.segments().len(), 1);
    Ok(())
}
