pub mod compile_time {
    pub mod file_processing {
        /// Maximum file size allowed for classification (16MB)
        /// SECURITY: Prevents memory exhaustion via huge inputs
        pub const MAX_FILE_SIZE: u64 = 16 * 1024 * 1024;

        /// Threshold for considering a file "large" (1MB)
        /// PERFORMANCE: Large files are reported at info level
        pub const LARGE_FILE_THRESHOLD: u64 = 1024 * 1024;

        /// Source file extensions parsed in regular mode
        pub const REGULAR_EXTENSIONS: &[&str] = &["cs"];

        /// Source file extensions parsed in script mode
        pub const SCRIPT_EXTENSIONS: &[&str] = &["csx"];
    }

    pub mod lexical {
        /// Maximum number of lexemes (tokens and trivia) in a single file
        /// SECURITY: Prevents DoS via token explosion
        pub const MAX_TOKEN_COUNT: usize = 4_000_000;

        /// Maximum nesting of interpolated strings inside interpolation holes
        /// SECURITY: Bounds the lexer mode stack
        pub const MAX_INTERPOLATION_DEPTH: usize = 64;

        /// Maximum nesting of `#if` blocks tracked by the directive state
        pub const MAX_DIRECTIVE_NESTING: usize = 256;

        /// Minimum run length of a merge conflict marker
        pub const CONFLICT_MARKER_LENGTH: usize = 7;

        /// Number of leading checkpoints kept per kilobyte of text, used
        /// only as an allocation hint
        pub const CHECKPOINTS_PER_KB: usize = 24;
    }

    pub mod syntax {
        /// Maximum parser recursion depth to prevent stack overflow
        /// SECURITY: Deeply nested input is skipped rather than recursed into
        pub const MAX_PARSE_DEPTH: usize = 256;

        /// Maximum error history buffer size
        /// RESOURCE: Controls memory usage for diagnostic tracking
        pub const MAX_ERROR_HISTORY: usize = 100;

        /// Maximum context stack depth recorded for diagnostics
        pub const MAX_CONTEXT_STACK_DEPTH: usize = 32;

        /// Maximum tokens scanned ahead when disambiguating generics,
        /// casts and lambdas
        /// PERFORMANCE: Bounds speculative lookahead
        pub const MAX_LOOKAHEAD_TOKENS: usize = 512;
    }

    pub mod binding {
        /// Maximum depth followed through base type chains
        /// SECURITY: Cyclic inheritance must not loop forever
        pub const MAX_BASE_TYPE_DEPTH: usize = 32;

        /// Maximum depth of member access chains typed by the binder
        pub const MAX_EXPRESSION_TYPING_DEPTH: usize = 64;

        /// Maximum alias indirections followed when resolving using aliases
        pub const MAX_ALIAS_DEPTH: usize = 16;

        /// How many nodes are visited between cancellation checks
        pub const CANCELLATION_CHECK_INTERVAL: usize = 64;
    }

    pub mod embedded {
        /// Literals longer than this are never sub-classified
        /// PERFORMANCE: Keeps embedded parsing bounded per literal
        pub const MAX_EMBEDDED_LITERAL_LENGTH: usize = 64 * 1024;

        /// Maximum number of literals sub-classified per file
        pub const MAX_EMBEDDED_LITERALS: usize = 4_096;

        /// Strong structural signals required before an untagged literal
        /// is treated as a probable regex
        pub const PROBABLE_REGEX_MIN_SIGNALS: usize = 2;

        /// Maximum group nesting in the regex sub-lexer
        pub const MAX_REGEX_NESTING: usize = 256;

        /// Maximum container nesting in the JSON sub-lexer
        pub const MAX_JSON_NESTING: usize = 256;
    }

    pub mod batch_processing {
        /// Maximum number of worker threads for file processing
        /// RESOURCE: Controls system resource consumption
        pub const MAX_WORKER_THREADS: usize = 16;

        /// Maximum files per batch to prevent memory exhaustion
        pub const MAX_FILES_PER_BATCH: usize = 10_000;
    }

    pub mod logging {
        /// Maximum log events per file before truncation
        /// SECURITY: Prevents DoS via log event explosion
        pub const MAX_LOG_EVENTS_PER_FILE: usize = 1_000;

        /// Maximum log message length
        pub const MAX_LOG_MESSAGE_LENGTH: usize = 10_000;

        /// Maximum events kept by the in-memory logger
        pub const MEMORY_LOGGER_CAPACITY: usize = 10_000;
    }
}
