fn main() {
    println!("cargo:rerun-if-env-changed=ALARM_CONFIG_JSON");

    // ESP-IDF link args are only needed when building the firmware image.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
