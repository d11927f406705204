// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::disposal::DisposalQueue;
use crate::{Error, ResourceKind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use wgpu::{Limits, PollType, Trace};

/// Downlevel limits, with texture dimensions raised to what the adapter supports.
///
/// Downlevel caps 2D textures at 2048, which is too small for a 4K render target.
fn required_limits(adapter_limits: &Limits) -> Limits {
    let mut limits = Limits::downlevel_defaults();
    limits.max_texture_dimension_1d = adapter_limits.max_texture_dimension_1d.max(limits.max_texture_dimension_1d);
    limits.max_texture_dimension_2d = adapter_limits.max_texture_dimension_2d.max(limits.max_texture_dimension_2d);
    limits
}

/**
Waits for one message from a wgpu callback, calling `poll` until it arrives or `timeout` passes.

Without a polling thread nothing else drives callbacks, so the waiter has to.
*/
fn poll_until<T>(receiver: &Receiver<T>, timeout: Duration, mut poll: impl FnMut()) -> Option<T> {
    let deadline = Instant::now() + timeout;
    loop {
        poll();
        match receiver.try_recv() {
            Ok(value) => return Some(value),
            Err(TryRecvError::Disconnected) => return None,
            Err(TryRecvError::Empty) => {}
        }
        if Instant::now() >= deadline {
            return None;
        }
        thread::sleep(Duration::from_millis(1));
    }
}

/// How to pick and open the adapter behind a [`WgpuDevice`].
///
/// The backend itself comes from the environment (`WGPU_BACKEND` and friends).
#[derive(Debug, Clone)]
pub struct WgpuDeviceOptions {
    pub power_preference: wgpu::PowerPreference,
    pub force_fallback_adapter: bool,
    pub label: String,
}

impl Default for WgpuDeviceOptions {
    fn default() -> Self {
        WgpuDeviceOptions {
            power_preference: wgpu::PowerPreference::default(),
            force_fallback_adapter: false,
            label: "native_texture device".to_string(),
        }
    }
}

/// Owns the actual GPU objects and the polling thread
#[derive(Debug)]
struct DeviceResources {
    device: wgpu::Device,
    queue: wgpu::Queue,
    adapter: wgpu::Adapter,
    poll_thread: Option<JoinHandle<()>>,
    poll_shutdown: Arc<AtomicBool>,
    poll_trigger: Sender<()>,
}

/// A [`crate::RenderDevice`] backed by wgpu.
///
/// Cloning is cheap; clones share the same device, queue and polling thread.
#[derive(Debug, Clone)]
pub struct WgpuDevice {
    resources: Arc<DeviceResources>,
}

impl WgpuDevice {
    pub async fn new(options: &WgpuDeviceOptions) -> Result<Self, Error> {
        let descriptor = wgpu::InstanceDescriptor::from_env_or_default();
        let instance = wgpu::Instance::new(&descriptor);
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: options.power_preference,
                force_fallback_adapter: options.force_fallback_adapter,
                compatible_surface: None,
            })
            .await?;
        logwise::info_sync!(
            "picked adapter {info}",
            info = logwise::privacy::LogIt(&adapter.get_info())
        );

        let descriptor = wgpu::DeviceDescriptor {
            label: Some(options.label.as_str()),
            required_features: Default::default(),
            required_limits: required_limits(&adapter.limits()),
            memory_hints: Default::default(),
            trace: Trace::Off,
        };
        let (device, queue) = adapter.request_device(&descriptor).await?;
        Ok(Self::from_parts(device, queue, adapter))
    }

    /// [`WgpuDevice::new`] for callers without an executor.
    pub fn new_blocking(options: &WgpuDeviceOptions) -> Result<Self, Error> {
        pollster::block_on(Self::new(options))
    }

    fn from_parts(device: wgpu::Device, queue: wgpu::Queue, adapter: wgpu::Adapter) -> Self {
        let poll_device = device.clone();
        let poll_shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = poll_shutdown.clone();
        let (poll_sender, poll_receiver): (Sender<()>, Receiver<()>) = mpsc::channel();

        // fences and map callbacks only fire while someone polls
        let poll_thread = thread::Builder::new()
            .name("wgpu_poll".to_string())
            .spawn(move || {
                while !shutdown_clone.load(Ordering::Relaxed) {
                    match poll_receiver.recv() {
                        Ok(_) => {
                            let _ = poll_device.poll(PollType::Wait);
                        }
                        Err(_) => break,
                    }
                }
            });
        let poll_thread = match poll_thread {
            Ok(handle) => Some(handle),
            Err(e) => {
                logwise::error_sync!(
                    "Failed to spawn wgpu polling thread: {err}",
                    err = logwise::privacy::LogIt(&e)
                );
                None
            }
        };

        WgpuDevice {
            resources: Arc::new(DeviceResources {
                device,
                queue,
                adapter,
                poll_thread,
                poll_shutdown,
                poll_trigger: poll_sender,
            }),
        }
    }

    /// Signal the polling thread that GPU work may be ready
    pub fn set_needs_poll(&self) {
        if self.resources.poll_thread.is_some() {
            let _ = self.resources.poll_trigger.send(());
        } else {
            let _ = self.resources.device.poll(PollType::Poll);
        }
    }

    /**
    Runs everything currently in `queue` once the GPU has finished all work submitted so far.

    This is the host side of [`crate::DisposalScheduler`]: textures disposed before this call
    can still be referenced by submitted command buffers, and this waits them out.
    */
    pub fn drain_disposals_when_idle(&self, queue: &DisposalQueue) {
        let batch = queue.take_batch();
        if batch.is_empty() {
            return;
        }
        logwise::trace_sync!("deferring {count} disposals until submitted work is done", count = batch.len());
        self.resources.queue.on_submitted_work_done(move || {
            batch.run();
        });
        self.set_needs_poll();
    }

    /**
    Receives the message a wgpu callback sends, giving up after `timeout`.

    With the polling thread running this just waits; otherwise it polls the device itself.
    */
    pub(super) fn wait_for_callback<T>(&self, receiver: &Receiver<T>, timeout: Duration) -> Option<T> {
        if self.resources.poll_thread.is_some() {
            self.set_needs_poll();
            match receiver.recv_timeout(timeout) {
                Ok(value) => Some(value),
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
            }
        } else {
            poll_until(receiver, timeout, || {
                let _ = self.resources.device.poll(PollType::Poll);
            })
        }
    }

    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.resources.adapter.get_info()
    }

    /// For recording passes that render into a [`crate::NativeTexture`].
    pub fn device(&self) -> &wgpu::Device {
        &self.resources.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.resources.queue
    }

    /// Runs `f` inside error scopes so allocation failures come back as [`Error::Allocation`]
    /// instead of reaching the device's uncaptured error handler.
    pub(super) fn allocating<R>(&self, resource: ResourceKind, f: impl FnOnce(&wgpu::Device) -> R) -> Result<R, Error> {
        let device = self.device();
        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let r = f(device);
        let validation = pollster::block_on(device.pop_error_scope());
        let out_of_memory = pollster::block_on(device.pop_error_scope());
        match validation.or(out_of_memory) {
            Some(e) => Err(Error::allocation(resource, e)),
            None => Ok(r),
        }
    }
}

impl Drop for DeviceResources {
    fn drop(&mut self) {
        self.poll_shutdown.store(true, Ordering::Relaxed);
        // wake the thread so it can observe the shutdown flag
        let _ = self.poll_trigger.send(());
        if let Some(handle) = self.poll_thread.take() {
            // the last clone can be released by a disposal running on the poll thread itself
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}
