#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    let path = std::env::args_os().nth(1).map(std::path::PathBuf::from);
    flame_canvas_ui::run_native(path)
}

// The web build starts from `flame_canvas_ui::start`.
#[cfg(target_arch = "wasm32")]
fn main() {}
