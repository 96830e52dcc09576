use compressed_mesh::MeshCapabilities;
use compressed_mesh::checksum::checksum_data;

use crate::CommonArgs;
use crate::prelude::*;
use crate::util::load_record;

#[derive(clap::Args, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    rarg: crate::ReadArgs,
    #[command(flatten)]
    inpath: crate::InputPath,
}

pub fn run(
    _args_common: &CommonArgs,
    args_cmd: &InfoArgs,
) -> AnyResult<()> {
    let record = load_record(&args_cmd.inpath.in_file, &args_cmd.rarg)?;
    let caps = MeshCapabilities::from(&args_cmd.rarg);
    let mesh = &record.mesh;

    println!(
        "record: {} of {} bytes, checksum {:016x}",
        record.consumed,
        record.bytes.len(),
        checksum_data(&record.bytes),
    );
    println!("vertices: {}", mesh.vertex_count());
    if caps.contains(MeshCapabilities::UV_INFO) {
        println!("uv_info: {:#010x}", mesh.uv_info);
    }
    println!(
        "{:<14} {:>10} {:>4} {:>10}  {}",
        "stream", "items", "bits", "bytes", "checksum"
    );
    for s in mesh.stream_summaries(caps) {
        println!(
            "{:<14} {:>10} {:>4} {:>10}  {:016x}",
            s.name, s.num_items, s.bit_size, s.byte_len, s.checksum
        );
    }

    Ok(())
}
