use std::io::Cursor;

use compressed_mesh::io::{Endian, EndianReader, EndianWriter};
use compressed_mesh::serialize::{read_compressed_mesh, write_compressed_mesh};
use compressed_mesh::{
    CodecError, ColorFloat, CompressSettings, CompressedMesh, DecompressedMesh,
    MeshCapabilities, PackedBitVector, UvChannel,
};
use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

fn quad() -> DecompressedMesh {
    let mut mesh = DecompressedMesh {
        vertices: Some(vec![
            Vec3::new(-1.0, 0.0, -1.0),
            Vec3::new(1.0, 0.0, -1.0),
            Vec3::new(1.0, 0.5, 1.0),
            Vec3::new(-1.0, 0.5, 1.0),
        ]),
        normals: Some(vec![
            Vec3::Y,
            Vec3::new(0.0, 0.6, -0.8),
            Vec3::new(0.48, 0.6, 0.64),
            Vec3::NEG_Z,
        ]),
        tangents: Some(vec![
            Vec4::new(1.0, 0.0, 0.0, 1.0),
            Vec4::new(0.0, 0.0, -1.0, -1.0),
            Vec4::new(0.6, 0.0, 0.8, 1.0),
            Vec4::new(-1.0, 0.0, 0.0, -1.0),
        ]),
        triangles: Some(vec![0, 1, 2, 0, 2, 3]),
        ..Default::default()
    };
    mesh.uv[0] = Some(UvChannel::from_vec2(&[
        Vec2::new(0.0, 0.0),
        Vec2::new(1.0, 0.0),
        Vec2::new(1.0, 1.0),
        Vec2::new(0.0, 1.0),
    ]));
    mesh
}

fn assert_close(what: &str, a: &[f32], b: &[f32], eps: f32) {
    assert_eq!(a.len(), b.len(), "{what}: length");
    for (i, (x, y)) in a.iter().zip(b).enumerate() {
        assert!((x - y).abs() <= eps, "{what}[{i}]: {x} vs {y}");
    }
}

#[test]
fn geometry_survives_a_round_trip() -> anyhow::Result<()> {
    let input = quad();
    let mut record = CompressedMesh::default();
    record.compress(&input, MeshCapabilities::modern(), &CompressSettings::default())?;
    assert!(record.is_set());
    assert_eq!(record.vertex_count(), 4);

    let output = record.decompress(MeshCapabilities::modern())?;
    let flat = |v: &Option<Vec<Vec3>>| -> Vec<f32> {
        bytemuck::cast_slice(v.as_deref().unwrap_or_default()).to_vec()
    };
    assert_close("vertices", &flat(&input.vertices), &flat(&output.vertices), 1e-4);
    assert_close("normals", &flat(&input.normals), &flat(&output.normals), 1e-3);

    let tangents_in: &[f32] = bytemuck::cast_slice(input.tangents.as_deref().unwrap_or_default());
    let tangents_out: &[f32] =
        bytemuck::cast_slice(output.tangents.as_deref().unwrap_or_default());
    assert_close("tangents", tangents_in, tangents_out, 1e-3);

    assert_eq!(output.triangles, input.triangles);
    assert_eq!(output.n_uv_channels(), 1);
    assert_close(
        "uv0",
        &input.uv[0].as_ref().map(|c| c.data.clone()).unwrap_or_default(),
        &output.uv[0].as_ref().map(|c| c.data.clone()).unwrap_or_default(),
        1e-4,
    );
    assert!(output.colors.is_none());
    assert!(output.skin.is_none());
    assert!(output.bind_poses.is_none());
    Ok(())
}

#[test]
fn sparse_uv_channels_keep_their_slots() -> anyhow::Result<()> {
    let mut input = quad();
    input.uv[2] = Some(UvChannel::new(3, (0..12).map(|i| i as f32 * 0.25).collect()));

    let mut record = CompressedMesh::default();
    record.compress(&input, MeshCapabilities::modern(), &CompressSettings::default())?;
    assert_eq!(record.uv_info, 0b0110_0000_0101);
    assert_eq!(record.uv.len(), 4 * 2 + 4 * 3);

    let output = record.decompress(MeshCapabilities::modern())?;
    assert!(output.uv[1].is_none());
    let uv2 = output.uv[2].as_ref().map(|c| (c.dimension, c.data.clone()));
    let (dimension, data) = uv2.unwrap_or_default();
    assert_eq!(dimension, 3);
    assert_close("uv2", &input.uv[2].as_ref().map(|c| c.data.clone()).unwrap_or_default(), &data, 1e-3);
    Ok(())
}

#[test]
fn legacy_uv_layout_holds_two_channels() -> anyhow::Result<()> {
    let mut input = quad();
    input.uv[1] = Some(UvChannel::new(2, vec![0.5; 8]));
    input.uv[3] = Some(UvChannel::new(2, vec![0.25; 8]));

    let mut record = CompressedMesh::default();
    record.compress(&input, MeshCapabilities::legacy(), &CompressSettings::default())?;
    assert_eq!(record.uv_info, 0);
    assert_eq!(record.uv.len(), 16);

    let output = record.decompress(MeshCapabilities::legacy())?;
    assert_eq!(output.n_uv_channels(), 2);
    assert_close(
        "uv1",
        &[0.5; 8],
        &output.uv[1].as_ref().map(|c| c.data.clone()).unwrap_or_default(),
        1e-4,
    );
    Ok(())
}

#[test]
fn legacy_colors_and_bind_poses() -> anyhow::Result<()> {
    let caps = MeshCapabilities::legacy();
    let pose = Mat4::from_scale_rotation_translation(
        Vec3::splat(2.0),
        Quat::from_rotation_y(0.5),
        Vec3::new(1.0, 2.0, 3.0),
    );
    let mut input = quad();
    input.colors = Some(vec![ColorFloat::new(1.0, 0.0, 0.0, 1.0); 4]);
    input.bind_poses = Some(vec![Mat4::IDENTITY, pose]);

    let mut record = CompressedMesh::default();
    record.compress(&input, caps, &CompressSettings::default())?;
    let colors_before = record.colors.clone();

    let output = record.decompress(caps)?;
    assert_eq!(output.colors, input.colors);
    assert_eq!(record.colors, colors_before);

    let poses = output.bind_poses.unwrap_or_default();
    assert_eq!(poses.len(), 2);
    assert!(poses[0].abs_diff_eq(Mat4::IDENTITY, 1e-4));
    assert!(poses[1].abs_diff_eq(pose, 1e-4));

    // The modern schema has neither stream.
    let output = record.decompress(MeshCapabilities::modern())?;
    assert!(output.colors.is_none());
    assert!(output.bind_poses.is_none());
    Ok(())
}

#[test]
fn float_colors_fall_back_to_packed_stream() -> anyhow::Result<()> {
    let caps = MeshCapabilities::FLOAT_COLORS | MeshCapabilities::COLORS;
    let mut record = CompressedMesh::default();
    record.colors.pack_uints_with_bit_size(&[0xff80_4000], 32)?;

    let colors = record.float_colors(caps)?;
    assert_eq!(colors.len(), 1);
    assert_eq!(colors[0].r, 0.0);
    assert_eq!(colors[0].g, 64.0 / 255.0);
    assert_eq!(colors[0].b, 128.0 / 255.0);
    assert_eq!(colors[0].a, 1.0);
    assert_eq!(record.colors.num_items, 1);
    assert_eq!(record.colors.bit_size, 32);
    Ok(())
}

#[test]
fn skin_weights_sum_to_one() -> anyhow::Result<()> {
    let mut record = CompressedMesh::default();
    record.weights.pack_uints(&[31, 10, 21, 10, 10, 5])?;
    record.bone_indices.pack_uints(&[5, 1, 2, 0, 1, 2, 3])?;

    let skin = record.skin_weights()?;
    assert_eq!(skin.len(), 3);
    assert_eq!(skin[0].indices[0], 5);
    assert_eq!(skin[1].indices[..2], [1, 2]);
    assert_eq!(skin[2].indices, [0, 1, 2, 3]);
    assert_eq!(skin[2].weights[3], 6.0 / 31.0);
    for bw in &skin {
        assert!((bw.total_weight() - 1.0).abs() < 1e-6);
    }

    // Implied fourth weight needs a bone index too.
    record.bone_indices.pack_uints(&[5, 1, 2, 0, 1, 2])?;
    assert!(record.skin_weights().unwrap_err().is_out_of_range());
    Ok(())
}

#[test]
fn records_serialize_in_both_byte_orders() -> anyhow::Result<()> {
    let mut input = quad();
    input.colors = Some(vec![ColorFloat::new(0.2, 0.4, 0.6, 1.0); 4]);
    input.bind_poses = Some(vec![Mat4::IDENTITY]);

    for caps in [MeshCapabilities::legacy(), MeshCapabilities::modern()] {
        let mut record = CompressedMesh::default();
        record.compress(&input, caps, &CompressSettings::default())?;

        for endian in [Endian::Little, Endian::Big] {
            let mut w = EndianWriter::new(Cursor::new(vec![]), endian);
            write_compressed_mesh(&mut w, &record, caps)?;
            let bytes = w.into_inner().into_inner();
            assert_eq!(bytes.len() % 4, 0);

            let mut r = EndianReader::new(Cursor::new(&bytes[..]), endian);
            let read = read_compressed_mesh(&mut r, caps)?;
            assert_eq!(read, record, "{caps:?} {endian:?}");
            assert_eq!(r.into_inner().position(), bytes.len() as u64);
        }
    }
    Ok(())
}

#[test]
fn truncated_stream_is_out_of_range() {
    let record = CompressedMesh {
        triangles: PackedBitVector {
            num_items: 10,
            bit_size: 8,
            data: vec![0; 4],
        },
        ..Default::default()
    };
    let err = record.triangles().unwrap_err();
    assert!(matches!(
        err,
        CodecError::OutOfRange { first: 0, count: 10, .. }
    ));
}
