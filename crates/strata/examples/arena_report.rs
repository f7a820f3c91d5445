//! Arena report: simulate a resource-loading session and print the arena.
//!
//! Demonstrates:
//!   1. Creating an arena with debug tracking
//!   2. Labelled allocations for textures, meshes and names
//!   3. Growing a decode buffer with `reallocate`
//!   4. Releasing resources and watching free chunks coalesce
//!   5. Printing the chunk table and logging it through `tracing`
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example arena_report

use strata::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), ArenaError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut arena = ArenaAllocator::new(ArenaConfig::new(256 * 1024))?;

    // ─── Load a few resources ───────────────────────────────────

    let texture = arena.allocate(64 * 64 * 4, 16, Some("TexRes - data - brick.png"))?;
    let texture_name = arena.allocate(10, 4, Some("TexRes - name - brick.png"))?;
    let mesh = arena.allocate(24 * 32, 16, Some("MdlRes - Mesh - cube.gltf"))?;
    let material = arena.allocate(64, 8, Some("MdlRes - Material - cube.gltf"))?;

    // A decoder that does not know its output size up front.
    let mut decode = arena.allocate(256, 16, Some("stbi scratch"))?;
    for size in [1024, 4096, 16 * 1024] {
        decode = arena.reallocate(decode, size, 16, None)?;
    }

    println!("{}", arena.report()?);

    // ─── Unload ─────────────────────────────────────────────────

    arena.release(decode)?;
    arena.release(texture_name)?;
    arena.release(texture)?;
    println!("\nafter unloading the texture:\n{}", arena.report()?);

    arena.release(mesh)?;
    arena.release(material)?;
    arena.dump();

    let stats = arena.stats()?;
    println!(
        "\nfinal: {} chunk(s), {} bytes free",
        stats.chunk_count, stats.free_bytes
    );
    Ok(())
}
