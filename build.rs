fn main() {
    println!("cargo:rerun-if-env-changed=SMARTSWITCH_CONFIG");

    // ESP-IDF link arguments are only needed for the board build.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
