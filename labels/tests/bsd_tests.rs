//! BSD disklabel scenarios (spec §8), grounded on the same
//! `MemDevice` + driver harness as `mbr_tests.rs`.

use ptable_core::test_support::MemDevice;
use ptable_core::{Context, DeviceGeometry, LabelDriver, PartitionTemplate, TypeId};
use ptable_labels::bsd::BsdDriver;
use std::cell::RefCell;
use std::rc::Rc;

fn fresh_context(sectors: u64) -> Context {
    let device: Rc<RefCell<dyn ptable_core::BlockDevice>> =
        Rc::new(RefCell::new(MemDevice::new(512, sectors)));
    let geometry = DeviceGeometry::simple(512, sectors);
    Context::new(device, geometry, ptable_core::test_support::ScriptedAskChannel::accepting())
}

#[test]
fn create_write_and_reread_round_trips() {
    let mut ctx = fresh_context(1_000_000);
    let driver = BsdDriver;
    driver.create(&mut ctx).unwrap();

    let partno = driver
        .add_partition(
            &mut ctx,
            PartitionTemplate {
                start: Some(2048),
                size: Some(100_000),
                ptype: Some(TypeId::Code(7)),
                ..Default::default()
            },
        )
        .unwrap();
    driver.write(&mut ctx).unwrap();
    driver.read(&mut ctx).unwrap();

    let p = driver.get_partition(&ctx, partno).unwrap();
    assert_eq!(p.start, 2048);
    assert_eq!(p.size(), 100_000);
    assert_eq!(p.ptype.id, TypeId::Code(7));
    assert!(driver.verify(&ctx).is_empty());
}

#[test]
fn add_partition_rejects_a_start_that_collides_with_an_existing_partition() {
    let mut ctx = fresh_context(1_000_000);
    let driver = BsdDriver;
    driver.create(&mut ctx).unwrap();
    driver
        .add_partition(
            &mut ctx,
            PartitionTemplate {
                start: Some(2048),
                size: Some(100_000),
                ptype: Some(TypeId::Code(7)),
                ..Default::default()
            },
        )
        .unwrap();

    let err = driver.add_partition(
        &mut ctx,
        PartitionTemplate {
            start: Some(50_000),
            size: Some(1_000),
            ptype: Some(TypeId::Code(7)),
            ..Default::default()
        },
    );
    assert!(err.is_err());
    assert_eq!(ctx.table.len(), 1);
}
