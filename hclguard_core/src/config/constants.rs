pub mod compile_time {
    pub mod file_processing {
        /// Maximum file size accepted for scanning (10MB)
        pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

        /// Extensions recognized as HCL sources, longest first
        pub const HCL_EXTENSIONS: &[&str] = &[".tftest.hcl", ".tf", ".hcl"];

        /// Directory names never descended into during discovery
        pub const SKIPPED_DIRECTORIES: &[&str] = &[".terraform", ".git", ".terragrunt-cache"];
    }

    pub mod scanner {
        /// Maximum number of simultaneously open delimiters before the scanner
        /// stops tracking deeper nesting
        pub const MAX_NESTING_DEPTH: usize = 256;

        /// Maximum labels accepted on one block header
        pub const MAX_HEADER_LABELS: usize = 8;
    }

    pub mod batch {
        /// Hard ceiling on files accepted into one batch
        pub const MAX_FILES_PER_BATCH: usize = 50_000;

        /// Upper bound on worker threads
        pub const MAX_WORKER_THREADS: usize = 64;
    }

    pub mod formatter {
        /// Default timeout for the external formatter process
        pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

        /// Lines of unified diff kept in a formatter finding preview
        pub const MAX_PREVIEW_LINES: usize = 30;
    }

    pub mod logging {
        /// Upper bound on events retained by `MemoryLogger`
        pub const MAX_BUFFERED_EVENTS: usize = 10_000;
    }
}
