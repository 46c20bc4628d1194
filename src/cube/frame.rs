//! Frame buffer pool
//!
//! Buffers cycle Free → Lent → Ready → Shown → Free. A lent buffer belongs to
//! exactly one task until it is submitted; the pool never hands it out again
//! before the refresh step has shown it and reclaimed it.

use core::ptr::NonNull;

use heapless::Deque;

use crate::config::{CUBE_FRAME_BUFFER_COUNT, CUBE_FRAME_SIZE, CUBE_LAYER_COUNT, CUBE_LAYER_SIZE};
use crate::error::{KernelError, KernelResult};
use crate::types::TaskId;

/// Raw frame contents
pub type FrameData = [u8; CUBE_FRAME_SIZE];

/// How a newly acquired buffer is prepared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameInit {
    /// Leave whatever the buffer held
    AsIs,
    /// Zero every byte
    Clear,
    /// Copy the most recently submitted frame
    Copy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameState {
    Free,
    Lent(TaskId),
    Ready,
    Shown,
}

/// Hardware side of the multiplexed display
pub trait CubePort {
    /// Drive one layer of the cube
    fn show_layer(&mut self, layer: u8, data: &[u8]);
    /// Turn every LED off
    fn blank(&mut self);
}

/// Port that drives nothing
pub struct NullPort;

impl CubePort for NullPort {
    fn show_layer(&mut self, _layer: u8, _data: &[u8]) {}
    fn blank(&mut self) {}
}

/// A buffer lent to a task
///
/// Not `Clone`: handing the frame back through `submit` or `release` ends the
/// loan. Dropping it keeps the slot lent until its owner is stopped.
#[must_use = "a dropped frame stays lent until released"]
pub struct Frame {
    index: u8,
    data: NonNull<FrameData>,
}

impl Frame {
    #[inline]
    pub fn index(&self) -> usize {
        self.index as usize
    }

    #[inline]
    pub fn data(&self) -> &FrameData {
        // SAFETY: the pool does not touch a lent buffer until it is submitted.
        unsafe { self.data.as_ref() }
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut FrameData {
        unsafe { self.data.as_mut() }
    }

    pub fn clear(&mut self) {
        self.data_mut().fill(0);
    }
}

/// Frame handles point into the pool, so a pool with lent frames must not move.
pub struct FramePool<const N: usize = CUBE_FRAME_BUFFER_COUNT> {
    buffers: [FrameData; N],
    state: [FrameState; N],
    /// Submitted buffers in submission order
    ready: Deque<u8, N>,
    shown: Option<u8>,
    last_submitted: Option<u8>,
    layer: u8,
    enabled: bool,
}

impl<const N: usize> FramePool<N> {
    pub const fn new() -> Self {
        FramePool {
            buffers: [[0; CUBE_FRAME_SIZE]; N],
            state: [FrameState::Free; N],
            ready: Deque::new(),
            shown: None,
            last_submitted: None,
            layer: 0,
            enabled: false,
        }
    }

    pub(crate) fn reset(&mut self) {
        for buf in self.buffers.iter_mut() {
            buf.fill(0);
        }
        self.state = [FrameState::Free; N];
        self.ready.clear();
        self.shown = None;
        self.last_submitted = None;
        self.layer = 0;
        self.enabled = false;
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Stop driving the port; frames keep cycling so producers do not stall
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    #[inline]
    pub fn state(&self, index: usize) -> Option<FrameState> {
        self.state.get(index).copied()
    }

    pub fn free_count(&self) -> usize {
        self.state.iter().filter(|s| **s == FrameState::Free).count()
    }

    /// Lend a free buffer to `owner`, or `None` if every buffer is busy
    pub fn acquire(&mut self, owner: TaskId, init: FrameInit) -> Option<Frame> {
        let index = self.state.iter().position(|s| *s == FrameState::Free)?;
        self.state[index] = FrameState::Lent(owner);

        match init {
            FrameInit::AsIs => {}
            FrameInit::Clear => self.buffers[index].fill(0),
            FrameInit::Copy => {
                if let Some(src) = self.last_submitted.map(usize::from) {
                    if src != index {
                        self.buffers[index] = self.buffers[src];
                    }
                }
            }
        }

        Some(Frame {
            index: index as u8,
            data: NonNull::from(&mut self.buffers[index]),
        })
    }

    /// Queue a lent buffer for display
    pub fn submit(&mut self, frame: Frame, owner: TaskId) -> KernelResult<()> {
        let index = frame.index();
        if self.state.get(index) != Some(&FrameState::Lent(owner)) {
            return Err(KernelError::FrameNotOwned);
        }

        self.state[index] = FrameState::Ready;
        // Cannot overflow: at most N buffers are ever ready.
        let _ = self.ready.push_back(frame.index);
        self.last_submitted = Some(frame.index);
        Ok(())
    }

    /// Return a lent buffer to the free list without showing it
    pub fn release(&mut self, frame: Frame, owner: TaskId) -> KernelResult<()> {
        let index = frame.index();
        if self.state.get(index) != Some(&FrameState::Lent(owner)) {
            return Err(KernelError::FrameNotOwned);
        }
        self.state[index] = FrameState::Free;
        Ok(())
    }

    /// Free every buffer lent to `owner`, returning whether any was
    pub fn release_owned(&mut self, owner: TaskId) -> bool {
        let mut freed = false;
        for state in self.state.iter_mut() {
            if *state == FrameState::Lent(owner) {
                *state = FrameState::Free;
                freed = true;
            }
        }
        freed
    }

    /// One multiplex step
    ///
    /// At a frame boundary the oldest queued frame replaces the shown one,
    /// which goes back to the free list. Returns true if a buffer was
    /// reclaimed.
    pub fn refresh(&mut self, port: &mut dyn CubePort) -> bool {
        let mut reclaimed = false;

        if self.layer == 0 {
            if let Some(next) = self.ready.pop_front() {
                if let Some(old) = self.shown.replace(next) {
                    self.state[old as usize] = FrameState::Free;
                    reclaimed = true;
                }
                self.state[next as usize] = FrameState::Shown;
            }
        }

        match self.shown {
            Some(index) if self.enabled => {
                let start = self.layer as usize * CUBE_LAYER_SIZE;
                let data = &self.buffers[index as usize][start..start + CUBE_LAYER_SIZE];
                port.show_layer(self.layer, data);
            }
            _ => port.blank(),
        }

        self.layer = (self.layer + 1) % CUBE_LAYER_COUNT as u8;
        reclaimed
    }
}

impl<const N: usize> Default for FramePool<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        layers: u32,
        blanks: u32,
        last: Option<(u8, u8)>,
    }

    impl CubePort for Recorder {
        fn show_layer(&mut self, layer: u8, data: &[u8]) {
            assert_eq!(data.len(), CUBE_LAYER_SIZE);
            self.layers += 1;
            self.last = Some((layer, data[0]));
        }

        fn blank(&mut self) {
            self.blanks += 1;
        }
    }

    const A: TaskId = TaskId::new(0);
    const B: TaskId = TaskId::new(1);

    fn full_frame(pool: &mut FramePool<4>, port: &mut Recorder) -> bool {
        let mut reclaimed = false;
        for _ in 0..CUBE_LAYER_COUNT {
            reclaimed |= pool.refresh(&mut *port);
        }
        reclaimed
    }

    #[test]
    fn test_lent_buffer_not_lent_twice() {
        let mut pool: FramePool<2> = FramePool::new();
        let a = pool.acquire(A, FrameInit::AsIs).unwrap();
        let b = pool.acquire(B, FrameInit::AsIs).unwrap();
        assert_ne!(a.index(), b.index());
        assert!(pool.acquire(A, FrameInit::AsIs).is_none());
        assert_eq!(pool.state(a.index()), Some(FrameState::Lent(A)));
        assert_eq!(pool.state(b.index()), Some(FrameState::Lent(B)));
    }

    #[test]
    fn test_submit_checks_owner() {
        let mut pool: FramePool<2> = FramePool::new();
        let a = pool.acquire(A, FrameInit::AsIs).unwrap();
        assert_eq!(pool.submit(a, B), Err(KernelError::FrameNotOwned));
    }

    #[test]
    fn test_buffer_reclaimed_only_after_shown() {
        let mut pool: FramePool<4> = FramePool::new();
        let mut port = Recorder::default();
        pool.enable();

        let first = pool.acquire(A, FrameInit::Clear).unwrap();
        let first_index = first.index();
        pool.submit(first, A).unwrap();

        assert!(!full_frame(&mut pool, &mut port));
        assert_eq!(pool.state(first_index), Some(FrameState::Shown));

        // Nothing newer queued, the shown frame stays up
        assert!(!full_frame(&mut pool, &mut port));

        let second = pool.acquire(A, FrameInit::Clear).unwrap();
        assert_ne!(second.index(), first_index);
        pool.submit(second, A).unwrap();

        assert!(full_frame(&mut pool, &mut port));
        assert_eq!(pool.state(first_index), Some(FrameState::Free));
        assert_eq!(port.layers, 3 * CUBE_LAYER_COUNT as u32);
    }

    #[test]
    fn test_exhausted_pool_recovers_through_refresh() {
        let mut pool: FramePool<4> = FramePool::new();
        let mut port = Recorder::default();
        for _ in 0..4 {
            let f = pool.acquire(A, FrameInit::AsIs).unwrap();
            pool.submit(f, A).unwrap();
        }
        assert!(pool.acquire(A, FrameInit::AsIs).is_none());

        full_frame(&mut pool, &mut port);
        assert!(pool.acquire(A, FrameInit::AsIs).is_none());

        assert!(full_frame(&mut pool, &mut port));
        assert_eq!(pool.free_count(), 1);
        assert!(pool.acquire(B, FrameInit::AsIs).is_some());
    }

    #[test]
    fn test_release_returns_buffer() {
        let mut pool: FramePool<2> = FramePool::new();
        let a = pool.acquire(A, FrameInit::AsIs).unwrap();
        let b = pool.acquire(A, FrameInit::AsIs).unwrap();
        assert_eq!(pool.free_count(), 0);

        assert_eq!(pool.release(b, B), Err(KernelError::FrameNotOwned));
        assert_eq!(pool.free_count(), 0);

        pool.release(a, A).unwrap();
        assert_eq!(pool.free_count(), 1);
        assert!(pool.acquire(B, FrameInit::AsIs).is_some());
    }

    #[test]
    fn test_release_owned_frees_dropped_frames() {
        let mut pool: FramePool<3> = FramePool::new();
        drop(pool.acquire(A, FrameInit::AsIs));
        drop(pool.acquire(A, FrameInit::AsIs));
        let kept = pool.acquire(B, FrameInit::AsIs).unwrap();
        assert_eq!(pool.free_count(), 0);

        assert!(pool.release_owned(A));
        assert_eq!(pool.free_count(), 2);
        assert_eq!(pool.state(kept.index()), Some(FrameState::Lent(B)));
        assert!(!pool.release_owned(A));
    }

    #[test]
    fn test_copy_takes_last_submitted() {
        let mut pool: FramePool<4> = FramePool::new();
        let mut f = pool.acquire(A, FrameInit::Clear).unwrap();
        f.data_mut()[5] = 0xAA;
        pool.submit(f, A).unwrap();

        let copy = pool.acquire(A, FrameInit::Copy).unwrap();
        assert_eq!(copy.data()[5], 0xAA);

        let mut cleared = pool.acquire(A, FrameInit::Clear).unwrap();
        assert_eq!(cleared.data()[5], 0);
        cleared.data_mut()[0] = 1;
        cleared.clear();
        assert!(cleared.data().iter().all(|b| *b == 0));
    }

    #[test]
    fn test_disabled_cube_blanks_but_cycles() {
        let mut pool: FramePool<4> = FramePool::new();
        let mut port = Recorder::default();
        for _ in 0..2 {
            let f = pool.acquire(A, FrameInit::AsIs).unwrap();
            pool.submit(f, A).unwrap();
        }
        full_frame(&mut pool, &mut port);
        assert!(full_frame(&mut pool, &mut port));
        assert_eq!(port.layers, 0);
        assert_eq!(port.blanks, 2 * CUBE_LAYER_COUNT as u32);
    }

    #[test]
    fn test_layers_are_sliced_in_order() {
        let mut pool: FramePool<2> = FramePool::new();
        let mut port = Recorder::default();
        pool.enable();

        let mut f = pool.acquire(A, FrameInit::Clear).unwrap();
        for layer in 0..CUBE_LAYER_COUNT {
            f.data_mut()[layer * CUBE_LAYER_SIZE] = layer as u8 + 1;
        }
        pool.submit(f, A).unwrap();

        for layer in 0..CUBE_LAYER_COUNT as u8 {
            pool.refresh(&mut port);
            assert_eq!(port.last, Some((layer, layer + 1)));
        }
    }
}
