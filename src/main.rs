#[cfg(not(target_arch = "wasm32"))]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    trojan_guide::backend::run().await
}

#[cfg(target_arch = "wasm32")]
fn main() {
    if let Err(error) = trojan_guide::frontend::run() {
        trojan_guide::frontend::report_startup_failure(&error);
    }
}
