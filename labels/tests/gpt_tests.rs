//! GPT round-trip and checksum-closure scenarios (spec §8).

use ptable_core::test_support::MemDevice;
use ptable_core::{Context, DeviceGeometry, LabelDriver, PartitionTemplate, TypeId};
use ptable_labels::gpt::GptDriver;
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
    let mut ctx = fresh_context(2_000_000);
    let driver = GptDriver;
    driver.create(&mut ctx).unwrap();

    driver
        .add_partition(
            &mut ctx,
            PartitionTemplate {
                start: Some(4096),
                size: Some(1_000_000),
                ptype: Some(TypeId::TypeStr(
                    "0fc63daf-8483-4772-8e79-3d69d8477de4".into(),
                )),
                name: Some("root".into()),
                ..Default::default()
            },
        )
        .unwrap();

    driver.write(&mut ctx).unwrap();
    driver.read(&mut ctx).unwrap();

    let p = driver.get_partition(&ctx, 1).unwrap();
    assert_eq!(p.start, 4096);
    assert_eq!(p.size(), 1_000_000);
    assert_eq!(p.name.as_deref(), Some("root"));
    assert!(driver.verify(&ctx).is_empty());
}

#[test]
fn add_partition_rejects_a_request_with_no_room() {
    let mut ctx = fresh_context(2_000_000);
    let driver = GptDriver;
    driver.create(&mut ctx).unwrap();

    driver
        .add_partition(
            &mut ctx,
            PartitionTemplate {
                start: Some(4096),
                size: Some(1_990_000),
                ..Default::default()
            },
        )
        .unwrap();

    let err = driver.add_partition(
        &mut ctx,
        PartitionTemplate {
            start: Some(4096),
            size: Some(1_000),
            ..Default::default()
        },
    );
    assert!(err.is_err());
    assert_eq!(ctx.table.len(), 1);
}

#[test]
fn probe_declines_a_disk_with_no_gpt_header() {
    let mut ctx = fresh_context(2_000_000);
    let driver = GptDriver;
    assert!(!driver.probe(&mut ctx).unwrap());
}
