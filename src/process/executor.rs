/*!
 * Process Executor
 * Spawns real OS processes and controls them with signals
 *
 * Each child gets a private pipe carrying its merged stdout/stderr. A
 * failed exec is reported back synchronously by `Command::spawn` over the
 * standard library's own close-on-exec status pipe, so a missing program
 * never stalls the batch.
 */

use super::control::{split_command, Discipline, ProcessControl};
use super::types::{ProcessError, ProcessResult};
use crate::core::types::{Millis, Pid};
use log::{debug, info, warn};
use nix::fcntl::{fcntl, FcntlArg, FdFlag, OFlag};
use nix::sys::signal::{kill, Signal};
use nix::unistd::{pipe, Pid as NixPid};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::os::fd::{AsRawFd, OwnedFd};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

/// Granularity of exit polling while a quantum runs
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Default captured output per child
pub const DEFAULT_OUTPUT_CAPACITY: usize = 64 * 1024;

/// Pipe carrying a child's merged stdout/stderr
#[derive(Debug)]
pub struct OutputChannel {
    read: File,
    write: OwnedFd,
}

impl OutputChannel {
    /// Both ends are close-on-exec so sibling children never inherit them
    pub fn open() -> ProcessResult<Self> {
        let (read, write) =
            pipe().map_err(|e| ProcessError::SpawnFailed(format!("pipe: {}", e)))?;
        for fd in [&read, &write] {
            fcntl(fd.as_raw_fd(), FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC))
                .map_err(|e| ProcessError::SpawnFailed(format!("fcntl: {}", e)))?;
        }
        Ok(Self {
            read: File::from(read),
            write,
        })
    }

    fn set_nonblocking(&self) -> ProcessResult<()> {
        fcntl(self.read.as_raw_fd(), FcntlArg::F_SETFL(OFlag::O_NONBLOCK))
            .map(|_| ())
            .map_err(|e| ProcessError::SpawnFailed(format!("fcntl: {}", e)))
    }
}

/// A live (or exited, not yet dropped) child
#[derive(Debug)]
pub struct OsHandle {
    child: Child,
    os_pid: Pid,
    output: File,
    discipline: Discipline,
    captured: Vec<u8>,
    capacity: usize,
    status: Option<ExitStatus>,
    eof: bool,
}

impl OsHandle {
    pub fn exit_status(&self) -> Option<ExitStatus> {
        self.status
    }

    /// Pull whatever is buffered in the pipe without blocking
    fn drain(&mut self) {
        if self.eof {
            return;
        }
        let mut buf = [0u8; 4096];
        loop {
            match self.output.read(&mut buf) {
                Ok(0) => {
                    self.eof = true;
                    break;
                }
                Ok(n) => self.keep(&buf[..n]),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) => {
                    warn!("Failed reading output of OS PID {}: {}", self.os_pid, e);
                    self.eof = true;
                    break;
                }
            }
        }
    }

    /// Blocking read until every writer closed the pipe
    fn read_to_eof(&mut self) {
        let mut buf = [0u8; 4096];
        while !self.eof {
            match self.output.read(&mut buf) {
                Ok(0) => self.eof = true,
                Ok(n) => self.keep(&buf[..n]),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!("Failed reading output of OS PID {}: {}", self.os_pid, e);
                    self.eof = true;
                }
            }
        }
    }

    fn keep(&mut self, bytes: &[u8]) {
        let room = self.capacity.saturating_sub(self.captured.len());
        self.captured
            .extend_from_slice(&bytes[..bytes.len().min(room)]);
    }

    fn try_reap(&mut self) -> ProcessResult<bool> {
        if self.status.is_some() {
            return Ok(true);
        }
        match self.child.try_wait() {
            Ok(Some(status)) => {
                debug!("OS PID {} exited with {:?}", self.os_pid, status.code());
                self.status = Some(status);
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(e) => Err(ProcessError::WaitFailed {
                pid: self.os_pid,
                reason: e.to_string(),
            }),
        }
    }

    fn signal(&self, signal: Signal) -> ProcessResult<()> {
        // Reaped children may have had their PID recycled
        if self.status.is_some() {
            return Ok(());
        }
        kill(NixPid::from_raw(self.os_pid as i32), signal).map_err(|e| {
            ProcessError::SignalFailed {
                pid: self.os_pid,
                signal: signal.as_str(),
                reason: e.to_string(),
            }
        })
    }
}

impl Drop for OsHandle {
    fn drop(&mut self) {
        if self.status.is_none() {
            warn!("Killing unfinished OS PID {}", self.os_pid);
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// Real OS process backend
pub struct OsExecutor {
    epoch: Instant,
    reserved: VecDeque<OutputChannel>,
    output_capacity: usize,
}

impl OsExecutor {
    pub fn new() -> Self {
        info!("Process executor initialized");
        Self {
            epoch: Instant::now(),
            reserved: VecDeque::new(),
            output_capacity: DEFAULT_OUTPUT_CAPACITY,
        }
    }

    pub fn with_output_capacity(mut self, capacity: usize) -> Self {
        self.output_capacity = capacity;
        self
    }

    /// Channels reserved but not yet consumed by a spawn
    pub fn reserved(&self) -> usize {
        self.reserved.len()
    }
}

impl Default for OsExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessControl for OsExecutor {
    type Handle = OsHandle;

    fn now_ms(&self) -> Millis {
        self.epoch.elapsed().as_millis() as Millis
    }

    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }

    fn reserve_channels(&mut self, count: usize) -> ProcessResult<()> {
        let mut channels = VecDeque::with_capacity(count);
        for _ in 0..count {
            channels.push_back(OutputChannel::open()?);
        }
        debug!("Reserved {} output channels", count);
        self.reserved = channels;
        Ok(())
    }

    fn spawn(&mut self, command: &str, discipline: Discipline) -> ProcessResult<OsHandle> {
        let args = split_command(command);
        let (program, rest) = args
            .split_first()
            .ok_or_else(|| ProcessError::ExecFailed("empty command".to_string()))?;

        let channel = match self.reserved.pop_front() {
            Some(channel) => channel,
            None => OutputChannel::open()?,
        };
        if discipline == Discipline::NonBlocking {
            channel.set_nonblocking()?;
        }
        let OutputChannel { read, write } = channel;
        let stderr = write
            .try_clone()
            .map_err(|e| ProcessError::SpawnFailed(format!("dup: {}", e)))?;

        // The write ends live only inside the Command and are closed on return
        let child = Command::new(program)
            .args(rest)
            .stdin(Stdio::null())
            .stdout(Stdio::from(write))
            .stderr(Stdio::from(stderr))
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                    ProcessError::ExecFailed(format!("{}: {}", program, e))
                }
                _ => ProcessError::SpawnFailed(format!("{}: {}", program, e)),
            })?;

        let os_pid = child.id();
        info!("Spawned OS process: '{}' (OS PID: {})", command, os_pid);

        Ok(OsHandle {
            child,
            os_pid,
            output: read,
            discipline,
            captured: Vec::new(),
            capacity: self.output_capacity,
            status: None,
            eof: false,
        })
    }

    fn os_pid(&self, handle: &OsHandle) -> Pid {
        handle.os_pid
    }

    fn pause(&mut self, handle: &mut OsHandle) -> ProcessResult<()> {
        handle.signal(Signal::SIGSTOP)?;
        debug!("Paused OS PID {}", handle.os_pid);
        Ok(())
    }

    fn resume(&mut self, handle: &mut OsHandle) -> ProcessResult<()> {
        handle.signal(Signal::SIGCONT)?;
        debug!("Resumed OS PID {}", handle.os_pid);
        Ok(())
    }

    fn poll_exited(&mut self, handle: &mut OsHandle) -> ProcessResult<bool> {
        handle.drain();
        handle.try_reap()
    }

    fn wait_exit_timeout(&mut self, handle: &mut OsHandle, timeout: Duration) -> ProcessResult<bool> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.poll_exited(handle)? {
                return Ok(true);
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(false);
            }
            std::thread::sleep(EXIT_POLL_INTERVAL.min(deadline - now));
        }
    }

    fn wait(&mut self, handle: &mut OsHandle) -> ProcessResult<()> {
        match handle.discipline {
            Discipline::Blocking => {
                handle.read_to_eof();
                let status = handle.child.wait().map_err(|e| ProcessError::WaitFailed {
                    pid: handle.os_pid,
                    reason: e.to_string(),
                })?;
                handle.status = Some(status);
                Ok(())
            }
            // Keep draining so a chatty child never blocks on a full pipe
            Discipline::NonBlocking => {
                while !self.poll_exited(handle)? {
                    std::thread::sleep(EXIT_POLL_INTERVAL);
                }
                Ok(())
            }
        }
    }

    fn take_output(&mut self, handle: &mut OsHandle) -> String {
        if handle.discipline == Discipline::NonBlocking {
            handle.drain();
        }
        let output = String::from_utf8_lossy(&handle.captured).into_owned();
        handle.captured.clear();
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_captures_merged_output() {
        let mut executor = OsExecutor::new();
        let mut handle = executor.spawn("echo hello", Discipline::Blocking).unwrap();
        assert!(executor.os_pid(&handle) > 0);

        executor.wait(&mut handle).unwrap();
        assert_eq!(executor.take_output(&mut handle), "hello\n");
        assert!(handle.exit_status().unwrap().success());
    }

    #[test]
    fn test_missing_program_is_exec_failure() {
        let mut executor = OsExecutor::new();
        let err = executor
            .spawn("definitely-not-a-real-program-xyz", Discipline::NonBlocking)
            .unwrap_err();
        assert!(matches!(err, ProcessError::ExecFailed(_)));
    }

    #[test]
    fn test_empty_command_is_exec_failure() {
        let mut executor = OsExecutor::new();
        assert!(matches!(
            executor.spawn("   ", Discipline::Blocking),
            Err(ProcessError::ExecFailed(_))
        ));
    }

    #[test]
    fn test_pause_resume_and_timeout() {
        let mut executor = OsExecutor::new();
        let mut handle = executor.spawn("sleep 0.2", Discipline::NonBlocking).unwrap();

        assert!(!executor
            .wait_exit_timeout(&mut handle, Duration::from_millis(20))
            .unwrap());
        executor.pause(&mut handle).unwrap();
        assert!(!executor.poll_exited(&mut handle).unwrap());
        executor.resume(&mut handle).unwrap();

        assert!(executor
            .wait_exit_timeout(&mut handle, Duration::from_secs(5))
            .unwrap());
        // Signalling a reaped child is a no-op
        assert!(executor.pause(&mut handle).is_ok());
    }

    #[test]
    fn test_reserved_channels_are_consumed() {
        let mut executor = OsExecutor::new();
        executor.reserve_channels(2).unwrap();
        assert_eq!(executor.reserved(), 2);

        let mut handle = executor.spawn("true", Discipline::NonBlocking).unwrap();
        assert_eq!(executor.reserved(), 1);
        executor.wait(&mut handle).unwrap();
    }

    #[test]
    fn test_output_capacity_truncates() {
        let mut executor = OsExecutor::new().with_output_capacity(4);
        let mut handle = executor
            .spawn("echo abcdefgh", Discipline::Blocking)
            .unwrap();
        executor.wait(&mut handle).unwrap();
        assert_eq!(executor.take_output(&mut handle), "abcd");
    }
}
