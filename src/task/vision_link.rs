//! Vision Co-processor Link
//!
//! The camera and the detection model sit on a co-processor attached to
//! UART0. [`VisionCamera`] and [`VisionEngine`] share one [`VisionLink`]
//! behind a mutex; every request holds the lock until its reply has been
//! read completely.
//!
//! # Resynchronisation
//! An inference raced out by its timeout drops the in-flight read halfway
//! through a reply. Reply headers are therefore found by scanning for the
//! start byte, and replies to an unexpected opcode are read and discarded.

use bottle_toppler::protocol::vision::{
    self, FrameInfo, Header, Opcode, Status, FRAME_INFO_LEN, HEADER_LEN,
};
use bottle_toppler::system::error::{CameraError, EngineError, ProtocolError};
use bottle_toppler::system::platform::{Camera, DetectionEngine, Frame, RawDetections};
use defmt::{debug, info, warn};
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{self, Async, Uart};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::{with_timeout, Duration, Timer};
use static_cell::StaticCell;

use crate::task::resources::{Irqs, VisionLinkResources};

/// Link speed to the co-processor
const BAUD_RATE: u32 = 921_600;

/// Longest wait for the first byte of a reply
const REPLY_TIMEOUT: Duration = Duration::from_secs(3);

/// Status polls while the co-processor boots
const STATUS_ATTEMPTS: u8 = 10;
const STATUS_RETRY: Duration = Duration::from_millis(500);

/// Replies to other requests skipped before giving up
const MAX_STALE_REPLIES: u8 = 4;

/// Largest INFER reply payload
const DETECTIONS_CAPACITY: usize = vision::detections_len(u8::MAX);

/// Problems on the link itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum LinkFault {
    Uart(uart::Error),
    Protocol(ProtocolError),
    Timeout,
}

impl From<uart::Error> for LinkFault {
    fn from(e: uart::Error) -> Self {
        LinkFault::Uart(e)
    }
}

impl From<ProtocolError> for LinkFault {
    fn from(e: ProtocolError) -> Self {
        LinkFault::Protocol(e)
    }
}

impl From<LinkFault> for CameraError {
    fn from(fault: LinkFault) -> Self {
        warn!("vision link: {:?}", fault);
        CameraError::Link
    }
}

impl From<LinkFault> for EngineError {
    fn from(fault: LinkFault) -> Self {
        warn!("vision link: {:?}", fault);
        match fault {
            LinkFault::Protocol(_) => EngineError::Malformed,
            LinkFault::Uart(_) | LinkFault::Timeout => EngineError::Link,
        }
    }
}

pub struct VisionLink {
    uart: Uart<'static, UART0, Async>,
}

pub type SharedLink = Mutex<CriticalSectionRawMutex, VisionLink>;

static LINK: StaticCell<SharedLink> = StaticCell::new();

/// Brings up UART0; call once from main
pub fn init(r: VisionLinkResources) -> &'static SharedLink {
    let mut config = uart::Config::default();
    config.baudrate = BAUD_RATE;
    let uart = Uart::new(r.uart, r.tx_pin, r.rx_pin, Irqs, r.tx_dma, r.rx_dma, config);
    LINK.init(Mutex::new(VisionLink { uart }))
}

impl VisionLink {
    async fn send(&mut self, header: Header, payload: &[u8]) -> Result<(), LinkFault> {
        self.uart.write(&header.encode()).await?;
        if !payload.is_empty() {
            self.uart.write(payload).await?;
        }
        Ok(())
    }

    async fn read(&mut self, buf: &mut [u8]) -> Result<(), LinkFault> {
        with_timeout(REPLY_TIMEOUT, self.uart.read(buf))
            .await
            .map_err(|_| LinkFault::Timeout)??;
        Ok(())
    }

    /// Next reply header answering `opcode`
    async fn reply(&mut self, opcode: Opcode) -> Result<Header, LinkFault> {
        for _ in 0..=MAX_STALE_REPLIES {
            let mut header = [0u8; HEADER_LEN];
            loop {
                self.read(&mut header[..1]).await?;
                if header[0] == vision::START {
                    break;
                }
            }
            self.read(&mut header[1..]).await?;
            let header = Header::decode(&header)?;
            if header.opcode == opcode {
                return Ok(header);
            }
            debug!("skipping stale {:?} reply", header.opcode);
            self.skip(header.len).await?;
        }
        Err(ProtocolError::UnexpectedReply(opcode as u8).into())
    }

    async fn skip(&mut self, mut len: u32) -> Result<(), LinkFault> {
        let mut scratch = [0u8; 64];
        while len > 0 {
            let n = (len as usize).min(scratch.len());
            self.read(&mut scratch[..n]).await?;
            len -= n as u32;
        }
        Ok(())
    }

    async fn status(&mut self) -> Result<Status, LinkFault> {
        self.send(Header::new(Opcode::Status, 0), &[]).await?;
        let header = self.reply(Opcode::Status).await?;
        header.expect(Opcode::Status, Some(Status::LEN))?;
        let mut payload = [0u8; Status::LEN as usize];
        self.read(&mut payload).await?;
        Ok(Status::parse(&payload)?)
    }

    /// Polls STATUS until the co-processor answers
    async fn wait_ready(&mut self) -> Result<Status, LinkFault> {
        let mut last = LinkFault::Timeout;
        for _ in 0..STATUS_ATTEMPTS {
            match self.status().await {
                Ok(status) => return Ok(status),
                Err(fault) => last = fault,
            }
            Timer::after(STATUS_RETRY).await;
        }
        Err(last)
    }
}

/// A captured frame, RGB888 row-major
pub struct RgbFrame<'a> {
    width: u16,
    height: u16,
    pixels: &'a [u8],
}

impl Frame for RgbFrame<'_> {
    fn width(&self) -> u16 {
        self.width
    }

    fn height(&self) -> u16 {
        self.height
    }

    fn rgb(&self, x: u16, y: u16) -> [u8; 3] {
        let at = (usize::from(y) * usize::from(self.width) + usize::from(x)) * 3;
        [self.pixels[at], self.pixels[at + 1], self.pixels[at + 2]]
    }
}

pub struct VisionCamera {
    link: &'static SharedLink,
    pixels: &'static mut [u8],
}

impl VisionCamera {
    /// `pixels` bounds the largest frame accepted
    pub fn new(link: &'static SharedLink, pixels: &'static mut [u8]) -> Self {
        Self { link, pixels }
    }
}

impl Camera for VisionCamera {
    type Frame<'a> = RgbFrame<'a>;

    async fn open(&mut self) -> Result<(), CameraError> {
        let status = self.link.lock().await.wait_ready().await?;
        if !status.camera_ok {
            return Err(CameraError::Unavailable);
        }
        info!("camera ready");
        Ok(())
    }

    async fn capture(&mut self) -> Result<RgbFrame<'_>, CameraError> {
        let mut link = self.link.lock().await;
        link.send(Header::new(Opcode::Capture, 0), &[]).await?;
        let header = link.reply(Opcode::Capture).await?;

        let mut prefix = [0u8; FRAME_INFO_LEN];
        link.read(&mut prefix).await?;
        let info = FrameInfo::parse(&prefix).map_err(LinkFault::from)?;
        if let Err(e) = info.check_len(header.len, self.pixels.len()) {
            link.skip(header.len.saturating_sub(FRAME_INFO_LEN as u32)).await?;
            return Err(LinkFault::from(e).into());
        }

        let len = info.pixel_len();
        link.read(&mut self.pixels[..len]).await?;
        Ok(RgbFrame {
            width: info.width,
            height: info.height,
            pixels: &self.pixels[..len],
        })
    }

    async fn release(&mut self) {
        let mut link = self.link.lock().await;
        if let Err(fault) = link.send(Header::new(Opcode::Release, 0), &[]).await {
            warn!("camera release failed: {:?}", fault);
        }
    }
}

pub struct VisionEngine {
    link: &'static SharedLink,
    reply: [u8; DETECTIONS_CAPACITY],
}

impl VisionEngine {
    pub fn new(link: &'static SharedLink) -> Self {
        Self {
            link,
            reply: [0; DETECTIONS_CAPACITY],
        }
    }
}

impl DetectionEngine for VisionEngine {
    async fn load(&mut self) -> Result<(), EngineError> {
        let status = self.link.lock().await.wait_ready().await?;
        if !status.model_loaded {
            return Err(EngineError::ModelMissing);
        }
        info!("detection model loaded");
        Ok(())
    }

    async fn infer(&mut self, input: &[u8], size: u16) -> Result<RawDetections, EngineError> {
        let mut link = self.link.lock().await;
        let request = vision::infer_request(size);
        let header = Header::decode(&request).map_err(LinkFault::from)?;
        link.send(header, &request[HEADER_LEN..]).await?;
        link.uart.write(input).await.map_err(LinkFault::from)?;

        let header = link.reply(Opcode::Infer).await?;
        let len = header.len as usize;
        if len == 0 || len > self.reply.len() {
            link.skip(header.len).await?;
            return Err(EngineError::Malformed);
        }
        link.read(&mut self.reply[..len]).await?;
        vision::parse_detections(&self.reply[..len]).map_err(|e| LinkFault::from(e).into())
    }
}
