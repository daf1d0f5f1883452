//! Application-wide constants for Redfish paths, OEM actions and defaults

/// Redfish resource paths shared by Dell iDRAC firmware lines. These are the
/// defaults only; firmware revisions vary the schema, so every path can be
/// overridden through the `[endpoints]` config block.
pub mod redfish {
    /// Management controller base resource
    pub const MANAGER_PATH: &str = "/redfish/v1/Managers/iDRAC.Embedded.1";

    /// Session service collection (token login)
    pub const SESSION_PATH: &str = "/redfish/v1/SessionService/Sessions";

    /// Task service collection for job status reads
    pub const TASK_PATH: &str = "/redfish/v1/TaskService/Tasks";

    /// OEM action prefix on iDRAC10 and later
    pub const OEM_PREFIX_MODERN: &str = "OemManager";

    /// OEM action prefix on iDRAC9 and earlier
    pub const OEM_PREFIX_LEGACY: &str = "EID_674_Manager";

    /// Server Configuration Profile export action name
    pub const EXPORT_ACTION: &str = "ExportSystemConfiguration";

    /// Server Configuration Profile import action name
    pub const IMPORT_ACTION: &str = "ImportSystemConfiguration";
}

/// Default connection and job timing values
pub mod defaults {
    /// Per-request HTTP timeout in seconds
    pub const TIMEOUT_SECONDS: u64 = 30;

    /// Retries after the first failed attempt
    pub const RETRIES: u32 = 3;

    /// Base delay between retry attempts (doubles per attempt)
    pub const RETRY_DELAY_SECONDS: u64 = 2;

    /// Seconds between job status polls
    pub const POLL_INTERVAL_SECONDS: u64 = 15;

    /// Wall-clock budget for one controller job
    pub const JOB_TIMEOUT_SECONDS: u64 = 1800;

    /// How long broken reads are tolerated while a controller reboots
    pub const REBOOT_GRACE_SECONDS: u64 = 300;

    /// Directory for auto-generated export files
    pub const TEMPLATE_DIR: &str = "templates";
}

/// Limits and caps
pub mod limits {
    /// Ceiling for the exponential retry backoff, in seconds
    pub const MAX_BACKOFF_SECONDS: u64 = 60;
}

/// Environment variables honored for pipeline use
pub mod env {
    /// Controller username
    pub const USERNAME: &str = "IDRAC_USERNAME";

    /// Controller password
    pub const PASSWORD: &str = "IDRAC_PASSWORD";

    /// Config file path override
    pub const CONFIG_FILE: &str = "IDRAC_CONFIG_FILE";

    /// Source IP override (legacy single-group config only)
    pub const SOURCE_IP: &str = "IDRAC_SOURCE_IP";

    /// Comma-separated target IP override (legacy single-group config only)
    pub const TARGET_IPS: &str = "IDRAC_TARGET_IPS";
}
