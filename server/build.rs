//! Compiles `proto/input.proto` into the `kontroller.input.v1` module
//! consumed by `src/rpc.rs`, mirroring the teacher's checked-in
//! `src/proto/kontroller.v1.rs` but generated from source instead of
//! vendored.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tonic_build::configure()
        .build_server(true)
        .build_client(false)
        .compile(&["proto/input.proto"], &["proto"])?;

    println!("cargo:rerun-if-changed=proto/input.proto");

    Ok(())
}
