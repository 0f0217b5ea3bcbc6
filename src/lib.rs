#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod fifo;
pub mod radio;
pub mod regs;
pub mod status;

use core::marker::PhantomData;

use embassy_time::{Duration, Instant, Timer, with_timeout};
use embedded_hal::digital::v2::{InputPin, OutputPin};
use embedded_hal_async::{digital::Wait, spi::SpiBus};

use regs::REG_VERSION;

pub use config::ModemConfig;
pub use regs::PaOutput;

trait Sealed {}
#[allow(private_bounds)]
/// Sealed trait to implement two flavors of the driver where the DIO0 line
/// (mapped to the RX-done interrupt) can be either a simple input that is
/// polled or one implementing the Wait trait
pub trait DioPin: Sealed {
    type Pin: InputPin;

    #[allow(async_fn_in_trait)]
    async fn wait_rx_done(pin: &mut Self::Pin, timeout: Duration) -> Result<(), Sx127xError>;
}
pub struct DioPolling<I> {
    _marker: PhantomData<I>,
}
pub struct DioIrq<I> {
    _marker: PhantomData<I>,
}
impl<I> Sealed for DioPolling<I> {}
impl<I> Sealed for DioIrq<I> {}

impl<I: InputPin> DioPin for DioPolling<I> {
    type Pin = I;

    /// Poll DIO0 until the chip raises it
    async fn wait_rx_done(pin: &mut I, timeout: Duration) -> Result<(), Sx127xError> {
        let start = Instant::now();
        while pin.is_low().map_err(|_| Sx127xError::Pin)? {
            if start.elapsed() >= timeout {
                return Err(Sx127xError::RxTimeout);
            }
            Timer::after_micros(100).await;
        }
        Ok(())
    }
}

impl<I: InputPin + Wait> DioPin for DioIrq<I> {
    type Pin = I;

    /// Wait for the rising edge on DIO0 (returns immediately if already high)
    async fn wait_rx_done(pin: &mut I, timeout: Duration) -> Result<(), Sx127xError> {
        if pin.is_low().map_err(|_| Sx127xError::Pin)? {
            match with_timeout(timeout, pin.wait_for_high()).await {
                Ok(r) => r.map_err(|_| Sx127xError::Pin),
                Err(_) => Err(Sx127xError::RxTimeout),
            }
        } else {
            Ok(())
        }
    }
}

/// SX127x device
///
/// All operations take `&mut self`: the exclusive borrow serializes register
/// transactions on the shared SPI bus. Callers driving the radio from several
/// tasks must wrap the driver in a mutex and serialize whole begin/end
/// sequences, the chip has no transactional semantics across them.
pub struct Sx127x<O, SPI, M: DioPin> {
    /// Reset pin (active low)
    nreset: O,
    /// DIO0 line from the SX127x, raised on RX-done in reception modes
    dio0: M::Pin,
    /// SPI device
    spi: SPI,
    /// NSS output pin
    nss: O,
    /// Shadow of the implicit-header bit to skip redundant register writes.
    /// None until first pushed to the chip (invalidated by `init`).
    implicit_header: Option<bool>,
    /// Last programmed carrier frequency, selects the LF/HF RSSI offset
    frequency: u32,
}

/// Error using the SX127x
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Sx127xError {
    /// Unable to set/get a pin level
    Pin,
    /// Unable to use SPI
    Spi,
    /// Version register kept an unexpected value after repeated probing
    BadVersion(u8),
    /// TX-done did not appear within the allowed time
    TxTimeout,
    /// No packet within the allowed time
    RxTimeout,
    /// Buffer too small for the received payload
    InvalidSize,
}

// Create driver with a DIO0 pin not implementing wait
impl<I, O, SPI> Sx127x<O, SPI, DioPolling<I>>
where
    I: InputPin,
    O: OutputPin,
    SPI: SpiBus<u8>,
{
    /// Create an SX127x device polling the DIO0 level
    pub fn new_polling(nreset: O, dio0: I, spi: SPI, nss: O) -> Self {
        Self {
            nreset,
            dio0,
            spi,
            nss,
            implicit_header: None,
            frequency: 0,
        }
    }
}

// Create driver with a DIO0 pin implementing wait
impl<I, O, SPI> Sx127x<O, SPI, DioIrq<I>>
where
    I: InputPin + Wait,
    O: OutputPin,
    SPI: SpiBus<u8>,
{
    /// Create an SX127x device awaiting the DIO0 rising edge
    pub fn new(nreset: O, dio0: I, spi: SPI, nss: O) -> Self {
        Self {
            nreset,
            dio0,
            spi,
            nss,
            implicit_header: None,
            frequency: 0,
        }
    }
}

impl<O, SPI, M> Sx127x<O, SPI, M>
where
    O: OutputPin,
    SPI: SpiBus<u8>,
    M: DioPin,
{
    /// Reset the chip
    pub async fn reset(&mut self) -> Result<(), Sx127xError> {
        self.nreset.set_low().map_err(|_| Sx127xError::Pin)?;
        Timer::after_millis(10).await;
        self.nreset.set_high().map_err(|_| Sx127xError::Pin)?;
        Timer::after_millis(10).await;
        Ok(())
    }

    /// Check if DIO0 is high, i.e. an RX-done is pending (debug)
    pub fn rx_done_pending(&self) -> bool {
        self.dio0.is_high().unwrap_or(false)
    }

    /// Read a register: one address byte (top bit clear) then one data byte,
    /// NSS held low across the exchange
    pub async fn read_register(&mut self, addr: u8) -> Result<u8, Sx127xError> {
        let mut buf = [addr & 0x7F, 0x00];
        self.nss.set_low().map_err(|_| Sx127xError::Pin)?;
        self.spi
            .transfer_in_place(&mut buf)
            .await
            .map_err(|_| Sx127xError::Spi)?;
        self.nss.set_high().map_err(|_| Sx127xError::Pin)?;
        Ok(buf[1])
    }

    /// Write a register: one address byte (top bit set) then one data byte
    pub async fn write_register(&mut self, addr: u8, value: u8) -> Result<(), Sx127xError> {
        self.nss.set_low().map_err(|_| Sx127xError::Pin)?;
        self.spi
            .write(&[addr | 0x80, value])
            .await
            .map_err(|_| Sx127xError::Spi)?;
        self.nss.set_high().map_err(|_| Sx127xError::Pin)
    }

    /// Probe the version register, retrying while it reads zero
    pub(crate) async fn probe_version(&mut self) -> Result<u8, Sx127xError> {
        let mut version = 0;
        for _ in 0..5 {
            version = self.read_register(REG_VERSION).await?;
            if version != 0 {
                break;
            }
            Timer::after_millis(1).await;
        }
        Ok(version)
    }

    /// Dump the whole register file into `out` (debug)
    pub async fn dump_registers(&mut self, out: &mut [u8; 128]) -> Result<(), Sx127xError> {
        for (addr, slot) in out.iter_mut().enumerate() {
            *slot = self.read_register(addr as u8).await?;
        }
        Ok(())
    }
}
