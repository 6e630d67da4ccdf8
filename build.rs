use shadow_rs::ShadowBuilder;

fn main() {
    println!("cargo:rerun-if-changed=migrations");

    // Build metadata backs `accounts-rs --version`
    ShadowBuilder::builder()
        .build()
        .expect("Failed to generate build metadata");
}
