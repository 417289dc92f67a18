mod shell;

pub use shell::{build, build_with, default_config, DashboardView};
