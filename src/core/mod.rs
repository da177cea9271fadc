pub mod relay;
pub mod session;
pub mod stt;

// Re-export commonly used types for convenience
pub use relay::{Chunk, ChunkSequencer, TranscriptResult, TranscriptionClient};
pub use session::{Session, SessionError, SessionRegistry, SessionState};
pub use stt::{
    SttConfig, SttError, SttProvider, Transcriber, Transcription, create_transcriber,
    get_supported_stt_providers,
};
