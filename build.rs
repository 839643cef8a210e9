fn main() {
    // Secrets are baked in from the build environment (see config.rs).
    for var in [
        "HOMEWATCH_WIFI_SSID",
        "HOMEWATCH_WIFI_PASS",
        "HOMEWATCH_TELEGRAM_TOKEN",
        "HOMEWATCH_TELEGRAM_CHAT_ID",
        "HOMEWATCH_IO_USERNAME",
        "HOMEWATCH_IO_KEY",
        "HOMEWATCH_CAMERA_IP",
    ] {
        println!("cargo:rerun-if-env-changed={var}");
    }

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
