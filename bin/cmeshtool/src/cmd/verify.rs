use compressed_mesh::{CompressSettings, CompressedMesh, DecompressedMesh, MeshCapabilities};

use crate::CommonArgs;
use crate::prelude::*;
use crate::util::load_record;

#[derive(clap::Args, Debug)]
pub struct VerifyArgs {
    #[command(flatten)]
    inarg: crate::ReadArgs,
    #[command(flatten)]
    inpath: crate::InputPath,
    /// Largest per-component difference accepted after re-encoding
    #[arg(long, default_value_t = 1e-3)]
    tolerance: f32,
}

pub fn run(
    args_common: &CommonArgs,
    args_cmd: &VerifyArgs,
) -> AnyResult<()> {
    let caps = MeshCapabilities::from(&args_cmd.inarg);
    let record = load_record(&args_cmd.inpath.in_file, &args_cmd.inarg)?;
    if args_common.verbose {
        eprintln!("Record parsed, {} vertices.", record.mesh.vertex_count());
    }

    let mut decoded = record.mesh.decompress(caps)
        .context("Cannot decompress mesh attributes")?;
    println!(
        "vertices: {}, triangles: {}, uv channels: {}, colors: {}, skin: {}, bind poses: {}",
        decoded.n_vertices(),
        decoded.triangles.as_ref().map_or(0, |t| t.len() / 3),
        decoded.n_uv_channels(),
        decoded.colors.as_ref().map_or(0, Vec::len),
        decoded.skin.as_ref().map_or(0, Vec::len),
        decoded.bind_poses.as_ref().map_or(0, Vec::len),
    );

    // Skin weights are decode-only; check them here and leave them out
    // of the re-encode.
    if let Some(skin) = decoded.skin.take() {
        check_skin(&skin)?;
        if args_common.verbose {
            eprintln!("{} skin weights sum to one.", skin.len());
        }
    }

    let mut reencoded = CompressedMesh::default();
    reencoded.compress(&decoded, caps, &CompressSettings::default())
        .context("Cannot re-encode decoded attributes")?;
    let redecoded = reencoded.decompress(caps)
        .context("Cannot decompress re-encoded attributes")?;
    compare(&decoded, &redecoded, args_cmd.tolerance)?;
    println!("OK: re-encoded attributes match.");
    Ok(())
}

fn check_skin(skin: &[compressed_mesh::BoneWeight4]) -> AnyResult<()> {
    for (i, bw) in skin.iter().enumerate() {
        let total = bw.total_weight();
        // A vertex cut off by the end of the stream may sum to less.
        if i + 1 < skin.len() && (total - 1.0).abs() > 1e-5 {
            bail!("Skin weights of vertex {i} sum to {total}");
        }
    }
    Ok(())
}

fn compare(a: &DecompressedMesh, b: &DecompressedMesh, tolerance: f32) -> AnyResult<()> {
    compare_floats("vertices", flat(&a.vertices), flat(&b.vertices), tolerance)?;
    compare_floats("normals", flat(&a.normals), flat(&b.normals), tolerance)?;
    compare_floats("tangents", flat(&a.tangents), flat(&b.tangents), tolerance)?;
    compare_floats("colors", flat(&a.colors), flat(&b.colors), tolerance)?;
    compare_floats("bind_poses", flat(&a.bind_poses), flat(&b.bind_poses), tolerance)?;
    for (i, (ca, cb)) in a.uv.iter().zip(&b.uv).enumerate() {
        let dims = (ca.as_ref().map(|c| c.dimension), cb.as_ref().map(|c| c.dimension));
        if dims.0 != dims.1 {
            bail!("UV channel {i} changed from {:?} to {:?}", dims.0, dims.1);
        }
        compare_floats(
            "uv",
            ca.as_ref().map(|c| &c.data[..]).unwrap_or_default(),
            cb.as_ref().map(|c| &c.data[..]).unwrap_or_default(),
            tolerance,
        )?;
    }
    if a.triangles != b.triangles {
        bail!("Triangle indices differ after re-encoding");
    }
    Ok(())
}

fn flat<T: bytemuck::Pod>(v: &Option<Vec<T>>) -> &[f32] {
    bytemuck::cast_slice(v.as_deref().unwrap_or_default())
}

fn compare_floats(what: &str, a: &[f32], b: &[f32], tolerance: f32) -> AnyResult<()> {
    if a.len() != b.len() {
        bail!("{what}: {} values became {}", a.len(), b.len());
    }
    // Quantization error scales with the stream's value range.
    let span = a.iter().fold(0.0f32, |m, v| m.max(v.abs())).max(1.0);
    if let Some((i, (x, y))) = a
        .iter()
        .zip(b)
        .enumerate()
        .find(|(_, (x, y))| (*x - *y).abs() > tolerance * span)
    {
        bail!("{what}: value {i} changed from {x} to {y}");
    }
    Ok(())
}
