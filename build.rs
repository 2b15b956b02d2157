use std::env;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Host builds run the library tests only.
    if env::var("CARGO_CFG_TARGET_ARCH").as_deref() != Ok("xtensa") {
        return;
    }

    println!("cargo:rustc-link-arg-bins=-Tlinkall.x");
    println!("cargo:rustc-link-arg-tests=-Tlinkall.x");
    println!("cargo:rustc-link-arg-tests=-Tembedded-test.x");
}
