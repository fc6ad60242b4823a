use anyhow::Result;
use clap::Parser;
use cubeview_geometry::{Mesh, unit_cube};
use cubeview_render::FrameConfig;
use std::path::Path;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use winit::event_loop::{ControlFlow, EventLoop};

mod app;
mod keys;

use app::ViewerApp;

#[derive(Parser)]
#[command(name = "cubeview-desktop", about = "Spinning mesh viewer with a fly camera")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Optional Wavefront OBJ file to show instead of the built-in cube.
    /// Without it the viewer shows the cube and takes no other input.
    #[arg(long)]
    mesh: Option<PathBuf>,
}

/// Window creation parameters.
#[derive(Debug, Clone)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "OpenGL".into(),
            width: 800,
            height: 600,
        }
    }
}

/// The mesh to display. A file that fails to import is never shown; the
/// built-in cube takes its place.
fn load_mesh(path: Option<&Path>) -> Mesh {
    let Some(path) = path else {
        return unit_cube();
    };
    match cubeview_geometry::import(path) {
        Ok(scene) => scene.merged(),
        Err(_) => {
            tracing::warn!("falling back to the built-in cube");
            unit_cube()
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("cubeview-desktop starting");

    let mesh = load_mesh(cli.mesh.as_deref());

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = ViewerApp::new(WindowConfig::default(), FrameConfig::default(), mesh);
    event_loop.run_app(&mut app)?;

    app.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cubeview_geometry::Topology;

    #[test]
    fn default_window() {
        let config = WindowConfig::default();
        assert_eq!(config.title, "OpenGL");
        assert_eq!((config.width, config.height), (800, 600));
    }

    #[test]
    fn no_path_uses_cube() {
        assert_eq!(load_mesh(None), unit_cube());
    }

    #[test]
    fn failed_import_falls_back_to_cube() {
        let mesh = load_mesh(Some(Path::new("/nonexistent/definitely-missing.obj")));
        assert_eq!(mesh.topology, Topology::Quads);
        assert_eq!(mesh, unit_cube());
    }

    #[test]
    fn cli_parses_flags() {
        let cli = Cli::try_parse_from(["cubeview-desktop", "-v", "--mesh", "bunny.obj"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.mesh, Some(PathBuf::from("bunny.obj")));

        let cli = Cli::try_parse_from(["cubeview-desktop"]).unwrap();
        assert!(!cli.verbose);
        assert!(cli.mesh.is_none());
    }
}
