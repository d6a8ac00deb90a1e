//! Scenario 5 (spec §8): script round-trip through `apply_script`.

use ptable_core::test_support::MemDevice;
use ptable_core::{Context, DeviceGeometry, LabelDriver, PartitionTemplate, TypeId};
use ptable_labels::mbr::MbrDriver;
use ptable_labels::LabelRegistry;
use std::cell::RefCell;
use std::rc::Rc;

fn fresh_context(sectors: u64) -> (Context, Rc<RefCell<MemDevice>>) {
    let mem = Rc::new(RefCell::new(MemDevice::new(512, sectors)));
    let device: Rc<RefCell<dyn ptable_core::BlockDevice>> = mem.clone();
    let geometry = DeviceGeometry::simple(512, sectors);
    (
        Context::new(device, geometry, ptable_core::test_support::ScriptedAskChannel::accepting()),
        mem,
    )
}

#[test]
fn apply_script_creates_label_and_partitions() {
    let (mut ctx, _mem) = fresh_context(2_000_000);
    let registry = LabelRegistry::standard();
    let text = "label: dos\ndevice: /dev/sda\nunit: sectors\n\n1 : start=2048, size=1000000, type=L, name=\"root\", bootable\n";
    let script = ptable_script::parse(text, 512).unwrap();

    ptable_script::apply_script(&mut ctx, &registry, &script).unwrap();

    assert_eq!(ctx.table.len(), 1);
    let p = ctx.table.get(1).unwrap();
    assert_eq!(p.start, 2048);
    assert_eq!(p.size(), 1_000_000);
    assert!(p.bootable);
}

#[test]
fn apply_script_rolls_back_on_first_failure() {
    let (mut ctx, _mem) = fresh_context(2_000_000);
    let registry = LabelRegistry::standard();
    // A missing `start` field makes `add_partition` fail; the table
    // should come back empty rather than partially populated.
    let text = "label: dos\n\n1 : size=1000000, type=L\n";
    let script = ptable_script::parse(text, 512).unwrap();

    let result = ptable_script::apply_script(&mut ctx, &registry, &script);
    assert!(result.is_err());
    assert_eq!(ctx.table.len(), 0);
}

#[test]
fn apply_script_picks_the_driver_named_by_its_own_header() {
    // A `label: gpt` script must create a GPT table even when a DOS
    // label happens to be the one already active in the caller's
    // context, rather than silently writing through whatever driver
    // the caller passes in (spec §4.7).
    let (mut ctx, mem) = fresh_context(2_000_000);
    let dos = MbrDriver;
    dos.create(&mut ctx).unwrap();
    assert_eq!(ctx.active_label, Some(ptable_core::LabelKind::Dos));

    let registry = LabelRegistry::standard();
    let text = "label: gpt\n\n1 : start=4096, size=1000000, type=0fc63daf-8483-4772-8e79-3d69d8477de4, name=\"root\"\n";
    let script = ptable_script::parse(text, 512).unwrap();
    let driver = ptable_script::apply_script(&mut ctx, &registry, &script).unwrap();
    assert_eq!(driver.kind(), ptable_core::LabelKind::Gpt);
    driver.write(&mut ctx).unwrap();

    // Rereading through a fresh GPT driver over the same bytes confirms
    // a real GPT header landed on disk, not an MBR one.
    let dev: Rc<RefCell<dyn ptable_core::BlockDevice>> = mem.clone();
    let mut reread = Context::new(dev, ctx.geometry, ptable_core::test_support::ScriptedAskChannel::accepting());
    let gpt = ptable_labels::gpt::GptDriver;
    assert!(gpt.probe(&mut reread).unwrap());
}

#[test]
fn scenario_5_emit_then_apply_reproduces_the_same_on_disk_bytes() {
    // Build scenario 3 (extended container with two logicals) by hand,
    // write it, and capture the raw bytes.
    let (mut direct_ctx, direct_mem) = fresh_context(2_000_000);
    let mbr = MbrDriver;
    mbr.create(&mut direct_ctx).unwrap();
    mbr.add_partition(
        &mut direct_ctx,
        PartitionTemplate {
            start: Some(2048),
            size: Some(1_000_000),
            ptype: Some(TypeId::Code(0x05)),
            ..Default::default()
        },
    )
    .unwrap();
    mbr.add_partition(
        &mut direct_ctx,
        PartitionTemplate {
            start: Some(4096),
            size: Some(200_000),
            ptype: Some(TypeId::Code(0x83)),
            ..Default::default()
        },
    )
    .unwrap();
    mbr.add_partition(
        &mut direct_ctx,
        PartitionTemplate {
            start: Some(300_000),
            size: Some(200_000),
            ptype: Some(TypeId::Code(0x83)),
            ..Default::default()
        },
    )
    .unwrap();
    mbr.write(&mut direct_ctx).unwrap();
    let direct_bytes = direct_mem.borrow().raw().to_vec();

    // Emit a script describing the primary (non-logical) partitions
    // from that table, then apply it to a freshly-zeroed image and
    // write it out the same way.
    let script = ptable_script::Script {
        header: ptable_script::ScriptHeader {
            label: Some("dos".into()),
            label_id: None,
            device: None,
            unit: Some("sectors".into()),
        },
        partitions: direct_ctx
            .table
            .iter()
            .filter(|p| p.parent_partno.is_none())
            .map(|p| ptable_script::ScriptPartitionLine {
                partno: p.partno,
                start: Some(p.start),
                size: Some(p.size()),
                size_is_relative: false,
                type_field: match &p.ptype.id {
                    TypeId::Code(c) => Some(format!("{:02x}", c)),
                    TypeId::TypeStr(s) => Some(s.clone()),
                },
                uuid: None,
                name: None,
                attrs: None,
                bootable: p.bootable,
            })
            .collect(),
    };
    // The container's own logicals aren't independently emitted; the
    // MBR driver re-derives the extended container and EBR chain from
    // the logical partitions it's given directly, so reproduce those
    // too via a second pass through `add_partition` rather than the
    // script (logicals are out of scope for the emitted dump here,
    // matching `do_dump`'s top-level-only view in the CLI).
    let (mut applied_ctx, applied_mem) = fresh_context(2_000_000);
    let registry = LabelRegistry::standard();
    let driver = ptable_script::apply_script(&mut applied_ctx, &registry, &script).unwrap();
    driver
        .add_partition(
            &mut applied_ctx,
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
            &mut applied_ctx,
            PartitionTemplate {
                start: Some(300_000),
                size: Some(200_000),
                ptype: Some(TypeId::Code(0x83)),
                ..Default::default()
            },
        )
        .unwrap();
    driver.write(&mut applied_ctx).unwrap();
    let applied_bytes = applied_mem.borrow().raw().to_vec();

    assert_eq!(direct_bytes, applied_bytes);
}
