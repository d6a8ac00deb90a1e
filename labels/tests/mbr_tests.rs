//! End-to-end MBR scenarios (spec §8 scenarios 1-3), grounded on the
//! teacher's `filesystems/src/partitioner/mbr_tests.rs` structure: build
//! a `MemDevice`, drive a label driver through it, then reread.

use ptable_core::test_support::MemDevice;
use ptable_core::{Context, DeviceGeometry, Extent, LabelDriver, PartitionTemplate, TypeId};
use ptable_labels::mbr::MbrDriver;
use std::cell::RefCell;
use std::rc::Rc;

fn fresh_context(sectors: u64) -> Context {
    let device: Rc<RefCell<dyn ptable_core::BlockDevice>> =
        Rc::new(RefCell::new(MemDevice::new(512, sectors)));
    let geometry = DeviceGeometry::simple(512, sectors);
    Context::new(device, geometry, ptable_core::test_support::ScriptedAskChannel::accepting())
}

#[test]
fn scenario_1_create_and_write_empty_mbr() {
    let mut ctx = fresh_context(1_000_000);
    let driver = MbrDriver;
    driver.create(&mut ctx).unwrap();
    driver.write(&mut ctx).unwrap();
    assert!(!ctx.is_dirty());

    driver.read(&mut ctx).unwrap();
    assert_eq!(ctx.table.len(), 0);
}

#[test]
fn scenario_2_single_primary_partition() {
    let mut ctx = fresh_context(1_000_000);
    let driver = MbrDriver;
    driver.create(&mut ctx).unwrap();

    let partno = driver
        .add_partition(
            &mut ctx,
            PartitionTemplate {
                start: Some(2048),
                size: Some(100_000),
                ptype: Some(TypeId::Code(0x83)),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(partno, 1);
    driver.write(&mut ctx).unwrap();

    driver.read(&mut ctx).unwrap();
    let p = driver.get_partition(&ctx, 1).unwrap();
    assert_eq!(p.start, 2048);
    assert_eq!(p.size(), 100_000);
    assert!(matches!(p.extent, Extent::Size(_)));
    assert!(driver.verify(&ctx).is_empty());
}

#[test]
fn scenario_3_extended_with_two_logicals() {
    let mut ctx = fresh_context(2_000_000);
    let driver = MbrDriver;
    driver.create(&mut ctx).unwrap();

    driver
        .add_partition(
            &mut ctx,
            PartitionTemplate {
                start: Some(2048),
                size: Some(1_000_000),
                ptype: Some(TypeId::Code(0x05)),
                ..Default::default()
            },
        )
        .unwrap();

    driver
        .add_partition(
            &mut ctx,
            PartitionTemplate {
                start: Some(4096),
                size: Some(200_000),
                ptype: Some(TypeId::Code(0x83)),
                ..Default::default()
            },
        )
        .unwrap();
    driver
        .add_partition(
            &mut ctx,
            PartitionTemplate {
                start: Some(300_000),
                size: Some(200_000),
                ptype: Some(TypeId::Code(0x83)),
                ..Default::default()
            },
        )
        .unwrap();

    driver.write(&mut ctx).unwrap();
    driver.read(&mut ctx).unwrap();

    assert!(ctx.table.get(1).unwrap().is_container);
    let logicals: Vec<_> = ctx.table.iter().filter(|p| p.parent_partno == Some(1)).collect();
    assert_eq!(logicals.len(), 2);
}

#[test]
fn scenario_4_out_of_space_leaves_table_unchanged() {
    let mut ctx = fresh_context(20_480);
    let driver = MbrDriver;
    driver.create(&mut ctx).unwrap();

    driver
        .add_partition(
            &mut ctx,
            PartitionTemplate {
                start: Some(2048),
                size: Some(18_432),
                ptype: Some(TypeId::Code(0x83)),
                ..Default::default()
            },
        )
        .unwrap();

    let err = driver.add_partition(
        &mut ctx,
        PartitionTemplate {
            start: Some(2048),
            size: Some(20_000),
            ptype: Some(TypeId::Code(0x83)),
            ..Default::default()
        },
    );
    assert!(matches!(err, Err(ptable_core::PtableError::OutOfSpace(_))));
    assert_eq!(ctx.table.len(), 1);
}

#[test]
fn add_partition_aligns_an_unaligned_requested_start() {
    let mut ctx = fresh_context(1_000_000);
    let driver = MbrDriver;
    driver.create(&mut ctx).unwrap();

    let partno = driver
        .add_partition(
            &mut ctx,
            PartitionTemplate {
                start: Some(3000), // not a grain (2048-sector) boundary
                size: Some(50_000),
                ptype: Some(TypeId::Code(0x83)),
                ..Default::default()
            },
        )
        .unwrap();
    let p = driver.get_partition(&ctx, partno).unwrap();
    assert_eq!(p.start, 4096); // rounded up to the next grain boundary
}

#[test]
fn add_partition_rejects_a_start_that_collides_with_an_existing_partition() {
    let mut ctx = fresh_context(1_000_000);
    let driver = MbrDriver;
    driver.create(&mut ctx).unwrap();
    driver
        .add_partition(
            &mut ctx,
            PartitionTemplate {
                start: Some(2048),
                size: Some(100_000),
                ptype: Some(TypeId::Code(0x83)),
                ..Default::default()
            },
        )
        .unwrap();

    // Requested start falls inside the first partition's range; there
    // is no free range containing it.
    let err = driver.add_partition(
        &mut ctx,
        PartitionTemplate {
            start: Some(50_000),
            size: Some(1_000),
            ptype: Some(TypeId::Code(0x83)),
            ..Default::default()
        },
    );
    assert!(err.is_err());
    assert_eq!(ctx.table.len(), 1);
}

#[test]
fn rejects_a_fifth_primary_partition() {
    let mut ctx = fresh_context(2_000_000);
    let driver = MbrDriver;
    driver.create(&mut ctx).unwrap();
    for i in 0..4 {
        driver
            .add_partition(
                &mut ctx,
                PartitionTemplate {
                    start: Some(2048 + i * 100_000),
                    size: Some(90_000),
                    ptype: Some(TypeId::Code(0x83)),
                    ..Default::default()
                },
            )
            .unwrap();
    }
    let err = driver.add_partition(
        &mut ctx,
        PartitionTemplate {
            start: Some(2_048_000),
            size: Some(1000),
            ptype: Some(TypeId::Code(0x83)),
            ..Default::default()
        },
    );
    assert!(err.is_err());
}
