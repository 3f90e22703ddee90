use ripple::{AppConfig, run};

fn main() -> anyhow::Result<()> {
    run(AppConfig::new().title("Ripple").size(1280, 720))
}
