use freelist::{
    AllocResult, FreeList, InactivePortPolicy, PoolConfig, Snapshot, StepInput, Transition,
};

fn full_pool(forwarding: bool) -> FreeList {
    let config = PoolConfig::new(4).with_ports(1, 1).with_forwarding(forwarding);
    let full = Snapshot::from_taken(4, false, &[0, 1, 2, 3]).unwrap();
    FreeList::with_snapshot(config, &full).unwrap()
}

#[test]
fn test_sequential_allocate_then_free() {
    let mut pool = FreeList::new(PoolConfig::new(4).with_ports(1, 1)).unwrap();

    let out = pool.step(&StepInput::allocate(1)).unwrap();
    assert_eq!(out.results[0], AllocResult::granted(0));
    assert_eq!(out.occupancy.taken_slots(), vec![0]);

    let out = pool.step(&StepInput::allocate(1)).unwrap();
    assert_eq!(out.results[0], AllocResult::granted(1));
    assert_eq!(out.occupancy.taken_slots(), vec![0, 1]);

    let release = pool.dealloc_request(0).unwrap();
    let out = pool.step(&StepInput::new().with_dealloc([release])).unwrap();
    assert_eq!(out.results[0], AllocResult::NONE);
    assert_eq!(out.occupancy.taken_slots(), vec![1]);
}

#[test]
fn test_forwarding_reuses_slot_in_same_step() {
    let mut pool = full_pool(true);
    let release = pool.dealloc_request(2).unwrap();

    let out = pool.step(&StepInput::allocate(1).with_dealloc([release])).unwrap();
    assert_eq!(out.results[0], AllocResult::granted(2));
    assert!(!out.pool_empty);
    assert!(out.occupancy.is_full());
}

#[test]
fn test_without_forwarding_reuse_waits_one_step() {
    let mut pool = full_pool(false);
    let release = pool.dealloc_request(2).unwrap();

    let out = pool.step(&StepInput::allocate(1).with_dealloc([release])).unwrap();
    assert_eq!(out.results[0], AllocResult::NONE);
    assert!(out.pool_empty);
    assert_eq!(out.occupancy.taken_slots(), vec![0, 1, 3]);

    let out = pool.step(&StepInput::allocate(1)).unwrap();
    assert_eq!(out.results[0], AllocResult::granted(2));
}

#[test]
fn test_two_ports_cascade_in_one_step() {
    let mut pool = FreeList::new(PoolConfig::new(4).with_ports(2, 1)).unwrap();

    let out = pool.step(&StepInput::allocate(2)).unwrap();
    assert_eq!(out.results[0], AllocResult::granted(0));
    assert_eq!(out.results[1], AllocResult::granted(1));
    assert_eq!(out.occupancy.taken_slots(), vec![0, 1]);
}

#[test]
fn test_idle_first_port_still_reserves_its_pick() {
    let mut pool = FreeList::new(PoolConfig::new(4).with_ports(2, 1)).unwrap();

    let out = pool.step(&StepInput::new().with_alloc([false, true])).unwrap();
    assert_eq!(out.results[0], AllocResult::NONE);
    assert_eq!(out.results[1], AllocResult::granted(1));
    // The reserved pick is not committed, so slot 0 is free next step.
    assert_eq!(out.occupancy.taken_slots(), vec![1]);

    let out = pool.step(&StepInput::allocate(1)).unwrap();
    assert_eq!(out.results[0], AllocResult::granted(0));
}

#[test]
fn test_idle_first_port_with_skip_policy() {
    let config = PoolConfig::new(4)
        .with_ports(3, 1)
        .with_inactive_ports(InactivePortPolicy::Skip);
    let mut pool = FreeList::new(config).unwrap();

    let out = pool.step(&StepInput::new().with_alloc([false, true, true])).unwrap();
    let granted: Vec<_> = out.granted().collect();
    assert_eq!(granted, vec![0, 1]);
}

#[test]
fn test_exhaustion_mid_cascade() {
    let config = PoolConfig::new(3).with_ports(3, 1);
    let start = Snapshot::from_taken(3, false, &[0, 1]).unwrap();
    let mut pool = FreeList::with_snapshot(config, &start).unwrap();

    let out = pool.step(&StepInput::new().with_alloc([true, true, true])).unwrap();
    assert_eq!(out.results[0], AllocResult::granted(2));
    assert_eq!(out.results[1], AllocResult::NONE);
    assert_eq!(out.results[2], AllocResult::NONE);
    assert!(!out.pool_empty);
    assert!(pool.is_empty_pool());
}

#[test]
fn test_allocation_wins_tie_with_release() {
    let mut pool = full_pool(true);
    let release = pool.dealloc_request(0).unwrap();

    let out = pool.step(&StepInput::allocate(1).with_dealloc([release])).unwrap();
    assert_eq!(out.results[0], AllocResult::granted(0));
    assert!(out.occupancy.is_taken(0));
}

#[test]
fn test_reserved_slot_zero() {
    let config = PoolConfig::new(4).with_reserved_zero(true).with_ports(2, 2);
    let mut pool = FreeList::new(config).unwrap();
    assert_eq!(pool.free_count(), 3);

    let out = pool.step(&StepInput::allocate(2)).unwrap();
    assert_eq!(out.granted().collect::<Vec<_>>(), vec![1, 2]);

    // Freeing slot 0 is legal and does nothing.
    let releases = [pool.dealloc_request(0).unwrap(), pool.dealloc_request(1).unwrap()];
    let out = pool.step(&StepInput::new().with_dealloc(releases)).unwrap();
    assert_eq!(out.occupancy.taken_slots(), vec![2]);
    assert!(out.occupancy.is_taken(0));
}

#[test]
fn test_scan_chain_shifts_state_through() {
    let config = PoolConfig::new(4).with_ports(1, 1).with_scan_chain(true);
    let start = Snapshot::from_taken(4, false, &[2, 3]).unwrap();
    let mut pool = FreeList::with_snapshot(config, &start).unwrap();

    let mut scanned_out = Vec::new();
    for bit in [true, false, false, true] {
        let out = pool.step(&StepInput::new().with_scan(bit)).unwrap();
        assert_eq!(out.transition, Transition::Scan);
        scanned_out.push(out.scan_out.unwrap());
    }

    // Highest slot leaves first.
    assert_eq!(scanned_out, vec![true, true, false, false]);
    // First bit in ends up at the highest slot.
    assert_eq!(pool.occupancy().taken_slots(), vec![0, 3]);
}

#[test]
fn test_scan_chain_with_reserved_zero() {
    let config = PoolConfig::new(3)
        .with_reserved_zero(true)
        .with_ports(1, 1)
        .with_scan_chain(true);
    let mut pool = FreeList::new(config).unwrap();

    let out = pool.step(&StepInput::new().with_scan(true)).unwrap();
    assert_eq!(out.scan_out, Some(false));
    assert_eq!(out.occupancy.taken_slots(), vec![1]);

    let out = pool.step(&StepInput::new().with_scan(false)).unwrap();
    assert_eq!(out.scan_out, Some(false));
    assert_eq!(out.occupancy.taken_slots(), vec![2]);

    // Slot 0 never enters the chain.
    let out = pool.step(&StepInput::new().with_scan(false)).unwrap();
    assert_eq!(out.scan_out, Some(true));
    assert!(out.occupancy.taken_slots().is_empty());
    assert!(out.occupancy.is_taken(0));
}

#[test]
fn test_snapshot_load_restores_checkpoint() {
    let mut pool = FreeList::new(PoolConfig::new(8).with_ports(2, 2)).unwrap();
    pool.step(&StepInput::allocate(2)).unwrap();
    let checkpoint = pool.snapshot();

    pool.step(&StepInput::allocate(2)).unwrap();
    assert_eq!(pool.occupancy().count_taken(), 4);

    let out = pool.step(&StepInput::new().with_load(checkpoint.clone())).unwrap();
    assert_eq!(out.transition, Transition::Load);
    assert_eq!(pool.snapshot(), checkpoint);

    let bytes = checkpoint.to_bytes().unwrap();
    assert_eq!(Snapshot::from_bytes(&bytes).unwrap(), checkpoint);
}

#[test]
fn test_reset_frees_everything() {
    let mut pool = full_pool(true);
    let out = pool.step(&StepInput::allocate(1).with_reset()).unwrap();

    assert_eq!(out.transition, Transition::Reset);
    assert_eq!(out.results[0], AllocResult::NONE);
    assert_eq!(pool.free_count(), 4);

    let out = pool.step(&StepInput::allocate(1)).unwrap();
    assert_eq!(out.results[0], AllocResult::granted(0));
}

#[test]
fn test_json_output_shape() {
    let mut pool = FreeList::new(PoolConfig::new(4).with_ports(1, 1)).unwrap();
    let out = pool.step(&StepInput::allocate(1)).unwrap();

    let value = serde_json::to_value(&out).unwrap();
    assert_eq!(value["transition"], "update");
    assert_eq!(value["results"][0]["slot"], 0);
    assert_eq!(value["occupancy"], serde_json::json!([0]));
    assert!(value.get("scan_out").is_none());
}
