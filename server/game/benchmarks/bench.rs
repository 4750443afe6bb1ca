#![allow(clippy::wildcard_imports, clippy::cast_possible_truncation)]
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use masquerade_server::{
    data::*,
    identity::{PlayerHandle, impls::create_adapter},
};
use uuid::Uuid;

fn player() -> PlayerHandle {
    let original = IdentityData::new(
        Uuid::from_u64_pair(0x0f3c_2b1a, 0x9d8e_4f70),
        "Steve",
        Some(TextureBlob::signed("b3JpZ2luYWw=", "b3NpZw==")),
    );

    PlayerHandle::new(42, original)
}

fn profile() -> CharacterProfile {
    let mut profile = CharacterProfile::new(Uuid::from_u64_pair(0x0f3c_2b1a, 0x9d8e_4f70), "Sir Lancelot", 0);
    // roughly the size of a real texture document and signature
    profile.texture = Some(TextureBlob::signed("A".repeat(400), "B".repeat(684)));
    profile
}

fn identity_packets(c: &mut Criterion) {
    let player = player();
    let profile = profile();

    let mut group = c.benchmark_group("identity-packet");
    for revision in ProtocolRevision::ALL {
        let adapter = create_adapter(revision, revision.requires_signed_textures_by_default());

        group.bench_with_input(BenchmarkId::from_parameter(revision), &revision, |b, _| {
            b.iter(|| black_box(adapter.build_identity_packet(black_box(&player), black_box(&profile))));
        });
    }
    group.finish();

    let adapter = create_adapter(ProtocolRevision::V1_21_R1, true);
    c.bench_function("default-packet", |b| {
        b.iter(|| black_box(adapter.build_default_packet(black_box(&player))));
    });
}

fn decoding(c: &mut Criterion) {
    let adapter = create_adapter(ProtocolRevision::V1_20_R3, false);
    let packet = adapter.build_identity_packet(&player(), &profile()).unwrap();
    let (_, body) = packet.frames[1].split().unwrap();

    c.bench_function("decode-player-info-update", |b| {
        b.iter(|| {
            let mut reader = ByteReader::from_bytes(black_box(&body));
            black_box(reader.read_value::<v1_20_r3::PlayerInfoUpdatePacket>().unwrap())
        });
    });
}

criterion_group!(benches, identity_packets, decoding);
criterion_main!(benches);
