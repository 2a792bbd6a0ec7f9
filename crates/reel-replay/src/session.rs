//! The recording session state machine.
//!
//! ```text
//!          begin_recording            end_recording
//!   Idle ──────────────────> Recording ─────────────> Idle
//!   Idle ──────────────────> Playing ───────────────> Idle
//!          begin_playback      │  ▲    end_playback
//!                              └──┘ play_frame past the last frame
//!                                   restores the snapshot again
//! ```
//!
//! Recording and playing are mutually exclusive. Every file handle is owned
//! by the active state and closed on the transition out of it. Any I/O
//! failure while a session is active drops the session back to Idle.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use reel_arena::Arena;
use reel_core::{InputFrame, SlotId};

use crate::error::ReplayError;
use crate::reader::RecordingReader;
use crate::writer::RecordingWriter;

/// File extension of slot recordings.
pub const SLOT_EXTENSION: &str = "reel";

/// The file backing `slot` inside `dir`: `<dir>/slot_<n>.reel`.
pub fn slot_path(dir: &Path, slot: SlotId) -> PathBuf {
    dir.join(format!("slot_{}.{SLOT_EXTENSION}", slot.0))
}

/// What the session is doing, without the file handles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Live input flows straight to the module.
    Idle,
    /// Frames are being appended to the slot.
    Recording(SlotId),
    /// Frames are being read back from the slot.
    Playing(SlotId),
}

impl SessionState {
    fn describe(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording(_) => "recording",
            Self::Playing(_) => "playing",
        }
    }
}

enum Active {
    Idle,
    Recording {
        slot: SlotId,
        writer: RecordingWriter<BufWriter<File>>,
    },
    Playing {
        slot: SlotId,
        reader: RecordingReader<BufReader<File>>,
    },
}

/// Records input into slot files and plays it back in a loop.
pub struct Session {
    dir: PathBuf,
    active: Active,
    last_frames_written: u64,
    loops: u64,
}

impl Session {
    /// A session storing slot files in `dir`. Nothing is touched on disk
    /// until a recording starts.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            active: Active::Idle,
            last_frames_written: 0,
            loops: 0,
        }
    }

    /// Directory holding the slot files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        match &self.active {
            Active::Idle => SessionState::Idle,
            Active::Recording { slot, .. } => SessionState::Recording(*slot),
            Active::Playing { slot, .. } => SessionState::Playing(*slot),
        }
    }

    /// Whether a recording is in progress.
    pub fn is_recording(&self) -> bool {
        matches!(self.active, Active::Recording { .. })
    }

    /// Whether playback is in progress.
    pub fn is_playing(&self) -> bool {
        matches!(self.active, Active::Playing { .. })
    }

    /// Frames in the active recording, or in the last one if idle.
    pub fn frames_written(&self) -> u64 {
        match &self.active {
            Active::Recording { writer, .. } => writer.frames_written(),
            _ => self.last_frames_written,
        }
    }

    /// Frames read in the current pass of the active playback.
    pub fn frames_read(&self) -> u64 {
        match &self.active {
            Active::Playing { reader, .. } => reader.frames_read(),
            _ => 0,
        }
    }

    /// Times the active playback has wrapped back to its first frame.
    pub fn loops(&self) -> u64 {
        self.loops
    }

    fn ensure_idle(&self) -> Result<(), ReplayError> {
        match self.state() {
            SessionState::Idle => Ok(()),
            busy => Err(ReplayError::SessionBusy {
                active: busy.describe(),
            }),
        }
    }

    /// Start recording into `slot`: truncate its file and write the whole
    /// arena as the snapshot.
    pub fn begin_recording(&mut self, arena: &Arena, slot: SlotId) -> Result<(), ReplayError> {
        self.ensure_idle()?;
        std::fs::create_dir_all(&self.dir)?;
        let path = slot_path(&self.dir, slot);
        let file = File::create(&path)?;
        let writer = RecordingWriter::new(BufWriter::new(file), arena.as_bytes())?;
        log::info!(
            "recording slot {slot} to {} (snapshot {} bytes, hash {:#018x})",
            path.display(),
            arena.total_size(),
            writer.snapshot_hash()
        );
        self.active = Active::Recording { slot, writer };
        Ok(())
    }

    /// Append `frame` to the active recording. No-op unless recording.
    pub fn record_frame(&mut self, frame: &InputFrame) -> Result<(), ReplayError> {
        let Active::Recording { writer, .. } = &mut self.active else {
            return Ok(());
        };
        let result = writer.write_frame(frame);
        if result.is_err() {
            self.abort();
        }
        result
    }

    /// Flush and close the active recording. No-op unless recording.
    pub fn end_recording(&mut self) -> Result<(), ReplayError> {
        let (slot, mut writer) = match std::mem::replace(&mut self.active, Active::Idle) {
            Active::Recording { slot, writer } => (slot, writer),
            other => {
                self.active = other;
                return Ok(());
            }
        };
        self.last_frames_written = writer.frames_written();
        writer.flush()?;
        log::info!(
            "recording slot {slot} finished: {} frames",
            self.last_frames_written
        );
        Ok(())
    }

    fn open_playback(
        &self,
        arena: &mut Arena,
        slot: SlotId,
    ) -> Result<RecordingReader<BufReader<File>>, ReplayError> {
        let path = slot_path(&self.dir, slot);
        let file = File::open(&path)?;
        let expected = arena.total_size() as u64;
        let found = file.metadata()?.len();
        if found < expected {
            return Err(ReplayError::CorruptSnapshot { expected, found });
        }
        RecordingReader::open(BufReader::new(file), arena.as_bytes_mut())
    }

    /// Start playing `slot`: overwrite the arena with its snapshot and
    /// position at the first frame.
    ///
    /// The arena is left untouched if the file is missing or shorter than
    /// the arena.
    pub fn begin_playback(&mut self, arena: &mut Arena, slot: SlotId) -> Result<(), ReplayError> {
        self.ensure_idle()?;
        let reader = self.open_playback(arena, slot)?;
        log::info!(
            "playing slot {slot} (snapshot hash {:#018x})",
            reader.snapshot_hash()
        );
        self.loops = 0;
        self.active = Active::Playing { slot, reader };
        Ok(())
    }

    fn read_next(&mut self) -> Result<Option<InputFrame>, ReplayError> {
        match &mut self.active {
            Active::Playing { reader, .. } => reader.next_frame(),
            _ => Ok(None),
        }
    }

    fn next_looping(&mut self, arena: &mut Arena, slot: SlotId) -> Result<InputFrame, ReplayError> {
        if let Some(frame) = self.read_next()? {
            return Ok(frame);
        }
        let frames = self.frames_read();
        // Close before reopening the same file.
        self.active = Active::Idle;
        let reader = self.open_playback(arena, slot)?;
        self.loops += 1;
        log::debug!(
            "slot {slot} looped after {frames} frames (loop {}, hash {:#018x})",
            self.loops,
            reader.snapshot_hash()
        );
        self.active = Active::Playing { slot, reader };
        self.read_next()?
            .ok_or(ReplayError::EmptyRecording { slot })
    }

    /// The next recorded frame, or `None` unless playing.
    ///
    /// After the last frame the snapshot is restored into `arena` again and
    /// the first frame is returned. On error the session is back to Idle.
    pub fn play_frame(&mut self, arena: &mut Arena) -> Result<Option<InputFrame>, ReplayError> {
        let SessionState::Playing(slot) = self.state() else {
            return Ok(None);
        };
        match self.next_looping(arena, slot) {
            Ok(frame) => Ok(Some(frame)),
            Err(e) => {
                self.abort();
                Err(e)
            }
        }
    }

    /// Close the active playback. No-op unless playing.
    ///
    /// The arena keeps whatever state playback left it in; the caller is
    /// responsible for clearing held input.
    pub fn end_playback(&mut self) {
        match std::mem::replace(&mut self.active, Active::Idle) {
            Active::Playing { slot, reader } => log::info!(
                "playback of slot {slot} stopped after {} loops and {} frames",
                self.loops,
                reader.frames_read()
            ),
            other => self.active = other,
        }
    }

    /// Drop any active session without reporting errors.
    ///
    /// A recording's buffered frames still reach the slot file when the
    /// writer is dropped; a failure there goes unnoticed.
    pub fn abort(&mut self) {
        let state = self.state();
        if state != SessionState::Idle {
            log::warn!("{} session aborted", state.describe());
        }
        if let Active::Recording { writer, .. } = &self.active {
            self.last_frames_written = writer.frames_written();
        }
        self.active = Active::Idle;
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("dir", &self.dir)
            .field("state", &self.state())
            .field("loops", &self.loops)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_arena::ArenaConfig;

    fn arena() -> Arena {
        Arena::reserve(&ArenaConfig::new(4096, 4096)).unwrap()
    }

    fn frame(n: i32) -> InputFrame {
        let mut f = InputFrame::default();
        f.mouse_x = n;
        f.delta_seconds = 1.0 / 60.0;
        f
    }

    #[test]
    fn slot_path_is_deterministic() {
        let p = slot_path(Path::new("/tmp/rec"), SlotId(3));
        assert_eq!(p, PathBuf::from("/tmp/rec/slot_3.reel"));
    }

    #[test]
    fn file_is_snapshot_followed_by_frames() {
        let dir = tempfile::tempdir().unwrap();
        let mut arena = arena();
        arena.module_state_mut()[0] = 0x5A;
        let mut session = Session::new(dir.path());
        session.begin_recording(&arena, SlotId(1)).unwrap();
        for i in 0..3 {
            session.record_frame(&frame(i)).unwrap();
        }
        session.end_recording().unwrap();
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.frames_written(), 3);

        let bytes = std::fs::read(slot_path(dir.path(), SlotId(1))).unwrap();
        assert_eq!(bytes.len(), arena.total_size() + 3 * reel_core::FRAME_SIZE);
        assert_eq!(&bytes[..arena.total_size()], arena.as_bytes());
    }

    #[test]
    fn recording_and_playing_are_exclusive() {
        let dir = tempfile::tempdir().unwrap();
        let mut arena = arena();
        let mut session = Session::new(dir.path());
        session.begin_recording(&arena, SlotId(1)).unwrap();
        let err = session.begin_playback(&mut arena, SlotId(1)).unwrap_err();
        assert!(matches!(err, ReplayError::SessionBusy { active: "recording" }));
        let err = session.begin_recording(&arena, SlotId(2)).unwrap_err();
        assert!(matches!(err, ReplayError::SessionBusy { .. }));
        session.record_frame(&frame(0)).unwrap();
        session.end_recording().unwrap();

        session.begin_playback(&mut arena, SlotId(1)).unwrap();
        let err = session.begin_recording(&arena, SlotId(1)).unwrap_err();
        assert!(matches!(err, ReplayError::SessionBusy { active: "playing" }));
    }

    #[test]
    fn playback_of_missing_slot_is_io_and_leaves_arena() {
        let dir = tempfile::tempdir().unwrap();
        let mut arena = arena();
        arena.module_state_mut()[10] = 1;
        let mut session = Session::new(dir.path());
        let err = session.begin_playback(&mut arena, SlotId(9)).unwrap_err();
        assert!(matches!(err, ReplayError::Io(_)));
        assert_eq!(arena.module_state()[10], 1);
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn short_file_is_corrupt_and_leaves_arena() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(slot_path(dir.path(), SlotId(1)), [0xFFu8; 100]).unwrap();
        let mut arena = arena();
        let mut session = Session::new(dir.path());
        let err = session.begin_playback(&mut arena, SlotId(1)).unwrap_err();
        assert!(matches!(
            err,
            ReplayError::CorruptSnapshot { expected: 8192, found: 100 }
        ));
        assert!(arena.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn empty_recording_cannot_loop() {
        let dir = tempfile::tempdir().unwrap();
        let mut arena = arena();
        let mut session = Session::new(dir.path());
        session.begin_recording(&arena, SlotId(1)).unwrap();
        session.end_recording().unwrap();

        session.begin_playback(&mut arena, SlotId(1)).unwrap();
        let err = session.play_frame(&mut arena).unwrap_err();
        assert!(matches!(err, ReplayError::EmptyRecording { slot: SlotId(1) }));
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn truncated_frame_aborts_playback() {
        let dir = tempfile::tempdir().unwrap();
        let mut arena = arena();
        let mut session = Session::new(dir.path());
        session.begin_recording(&arena, SlotId(1)).unwrap();
        session.record_frame(&frame(0)).unwrap();
        session.end_recording().unwrap();

        let path = slot_path(dir.path(), SlotId(1));
        let mut bytes = std::fs::read(&path).unwrap();
        bytes.extend_from_slice(&[1, 2, 3]);
        std::fs::write(&path, bytes).unwrap();

        session.begin_playback(&mut arena, SlotId(1)).unwrap();
        assert_eq!(session.play_frame(&mut arena).unwrap().unwrap().mouse_x, 0);
        let err = session.play_frame(&mut arena).unwrap_err();
        assert!(matches!(err, ReplayError::TruncatedFrame { index: 1, found: 3 }));
        assert!(!session.is_playing());
    }

    #[test]
    fn idle_session_ignores_frames() {
        let dir = tempfile::tempdir().unwrap();
        let mut arena = arena();
        let mut session = Session::new(dir.path());
        session.record_frame(&frame(1)).unwrap();
        assert!(session.play_frame(&mut arena).unwrap().is_none());
        session.end_recording().unwrap();
        session.end_playback();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[test]
    fn rerecording_truncates_slot() {
        let dir = tempfile::tempdir().unwrap();
        let arena = arena();
        let mut session = Session::new(dir.path());
        session.begin_recording(&arena, SlotId(1)).unwrap();
        for i in 0..5 {
            session.record_frame(&frame(i)).unwrap();
        }
        session.end_recording().unwrap();
        session.begin_recording(&arena, SlotId(1)).unwrap();
        session.record_frame(&frame(0)).unwrap();
        session.end_recording().unwrap();
        let len = std::fs::metadata(slot_path(dir.path(), SlotId(1))).unwrap().len();
        assert_eq!(len as usize, arena.total_size() + reel_core::FRAME_SIZE);
    }

    #[test]
    fn abort_drops_recording() {
        let dir = tempfile::tempdir().unwrap();
        let arena = arena();
        let mut session = Session::new(dir.path());
        session.begin_recording(&arena, SlotId(2)).unwrap();
        session.record_frame(&frame(0)).unwrap();
        session.abort();
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.frames_written(), 1);
        let len = std::fs::metadata(slot_path(dir.path(), SlotId(2))).unwrap().len();
        assert_eq!(len as usize, arena.total_size() + reel_core::FRAME_SIZE);
    }

    #[test]
    fn ending_the_other_mode_leaves_session_alone() {
        let dir = tempfile::tempdir().unwrap();
        let mut arena = arena();
        let mut session = Session::new(dir.path());
        session.begin_recording(&arena, SlotId(1)).unwrap();
        session.end_playback();
        assert_eq!(session.state(), SessionState::Recording(SlotId(1)));
        session.record_frame(&frame(4)).unwrap();
        session.end_recording().unwrap();

        session.begin_playback(&mut arena, SlotId(1)).unwrap();
        session.end_recording().unwrap();
        assert_eq!(session.state(), SessionState::Playing(SlotId(1)));
        assert_eq!(session.play_frame(&mut arena).unwrap(), Some(frame(4)));
    }
}
