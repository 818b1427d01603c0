//! Benchmark for disk locator parsing and persistent volume translation

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use csi_volume_translator::{classify_disk_uri, disk_name, AzureDiskTranslator, InTreeTranslator};
use k8s_openapi::api::core::v1::{AzureDiskVolumeSource, PersistentVolume, PersistentVolumeSpec};

const MANAGED_URI: &str =
    "/subscriptions/12/resourceGroups/23/providers/Microsoft.Compute/disks/disk-0";
const UNMANAGED_URI: &str = "https://account.blob.core.windows.net/vhds/data-disk-0.vhd";

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("disk_locator");
    group.throughput(Throughput::Elements(1));

    group.bench_function("classify_managed", |b| {
        b.iter(|| classify_disk_uri(black_box(MANAGED_URI)))
    });
    group.bench_function("classify_unmanaged", |b| {
        b.iter(|| classify_disk_uri(black_box(UNMANAGED_URI)))
    });

    group.finish();
}

fn bench_disk_name(c: &mut Criterion) {
    let mut group = c.benchmark_group("disk_locator");
    group.throughput(Throughput::Elements(1));

    group.bench_function("disk_name_managed", |b| {
        b.iter(|| disk_name(black_box(MANAGED_URI)))
    });
    group.bench_function("disk_name_unmanaged", |b| {
        b.iter(|| disk_name(black_box(UNMANAGED_URI)))
    });

    group.finish();
}

fn bench_translate_pv(c: &mut Criterion) {
    let mut group = c.benchmark_group("translation");
    group.throughput(Throughput::Elements(1));

    let translator = AzureDiskTranslator::new();
    let pv = PersistentVolume {
        spec: Some(PersistentVolumeSpec {
            azure_disk: Some(AzureDiskVolumeSource {
                disk_name: "disk-0".to_string(),
                disk_uri: MANAGED_URI.to_string(),
                caching_mode: Some("ReadOnly".to_string()),
                fs_type: Some("ext4".to_string()),
                read_only: Some(true),
                ..AzureDiskVolumeSource::default()
            }),
            ..PersistentVolumeSpec::default()
        }),
        ..PersistentVolume::default()
    };

    group.bench_function("pv_to_csi", |b| {
        b.iter(|| translator.translate_in_tree_pv_to_csi(black_box(&pv)))
    });

    group.finish();
}

criterion_group!(benches, bench_classify, bench_disk_name, bench_translate_pv);
criterion_main!(benches);
