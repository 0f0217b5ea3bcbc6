//! # TX/RX operations
//!
//! The mode controller: operating mode transitions, the begin/end packet
//! sequence for transmission and the continuous/single reception state
//! machine. The chip returns to standby by itself on TX-done; single
//! reception is a one-shot the driver re-arms whenever a poll finds no
//! packet. The polling path ([`received_packet`](Sx127x::received_packet))
//! and the DIO0-driven path ([`wait_packet`](Sx127x::wait_packet)) share the
//! same flag-check and re-arm core.

use embassy_time::{Duration, Instant, Timer};
use embedded_hal::digital::v2::OutputPin;
use embedded_hal_async::spi::SpiBus;

use super::regs::*;
use super::status::{IRQ_MASK_TX_DONE, IrqFlags};
use super::{DioPin, Sx127x, Sx127xError};

/// Operating mode, always combined with the long-range (LoRa) bit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OpMode {
    Sleep = 0x00,
    Standby = 0x01,
    Tx = 0x03,
    RxContinuous = 0x05,
    RxSingle = 0x06,
}

impl OpMode {
    /// Register value for the mode, LoRa bit included
    pub fn value(self) -> u8 {
        MODE_LONG_RANGE | self as u8
    }
}

impl<O, SPI, M> Sx127x<O, SPI, M>
where
    O: OutputPin,
    SPI: SpiBus<u8>,
    M: DioPin,
{
    /// Write the operating mode register
    pub async fn set_mode(&mut self, mode: OpMode) -> Result<(), Sx127xError> {
        self.write_register(REG_OP_MODE, mode.value()).await
    }

    /// Put the chip in standby
    pub async fn standby(&mut self) -> Result<(), Sx127xError> {
        self.set_mode(OpMode::Standby).await
    }

    /// Put the chip in sleep mode
    pub async fn sleep(&mut self) -> Result<(), Sx127xError> {
        self.set_mode(OpMode::Sleep).await
    }

    /// Read the IRQ flags and clear the raised ones by writing them back
    pub async fn irq_flags(&mut self) -> Result<IrqFlags, Sx127xError> {
        let flags = self.read_register(REG_IRQ_FLAGS).await?;
        self.write_register(REG_IRQ_FLAGS, flags).await?;
        Ok(flags.into())
    }

    /// Prepare a transmission: standby, header mode, FIFO pointer back to the
    /// TX base and payload length zeroed. Payload bytes are then appended
    /// with [`write_payload`](Sx127x::write_payload).
    pub async fn begin_packet(&mut self, implicit_header: bool) -> Result<(), Sx127xError> {
        self.standby().await?;
        self.set_implicit_header(implicit_header).await?;
        self.write_register(REG_FIFO_ADDR_PTR, FIFO_TX_BASE_ADDR)
            .await?;
        self.write_register(REG_PAYLOAD_LENGTH, 0).await
    }

    /// Switch to TX and poll until TX-done, bounded by `timeout`.
    /// The chip goes back to standby on its own once the packet is out.
    pub async fn end_packet(&mut self, timeout: Duration) -> Result<(), Sx127xError> {
        self.set_mode(OpMode::Tx).await?;
        let start = Instant::now();
        loop {
            let flags: IrqFlags = self.read_register(REG_IRQ_FLAGS).await?.into();
            if flags.tx_done() {
                break;
            }
            if start.elapsed() >= timeout {
                return Err(Sx127xError::TxTimeout);
            }
            Timer::after_micros(100).await;
        }
        self.write_register(REG_IRQ_FLAGS, IRQ_MASK_TX_DONE).await
    }

    /// Transmit a payload: begin, fill the FIFO, then `repeat` transmissions
    /// of the same FIFO content. Returns the number of bytes actually queued,
    /// which is less than the payload length when it exceeds the FIFO space.
    pub async fn send(
        &mut self,
        payload: &[u8],
        repeat: u32,
        timeout: Duration,
    ) -> Result<usize, Sx127xError> {
        self.begin_packet(false).await?;
        let written = self.write_payload(payload).await?;
        for _ in 0..repeat {
            self.end_packet(timeout).await?;
        }
        Ok(written)
    }

    /// Start receiving. A non-zero `size` selects implicit header mode with
    /// a fixed payload length; zero selects explicit headers. DIO0 is mapped
    /// to RX-done and the chip enters continuous reception.
    pub async fn receive(&mut self, size: u8) -> Result<(), Sx127xError> {
        self.set_implicit_header(size > 0).await?;
        if size > 0 {
            self.write_register(REG_PAYLOAD_LENGTH, size).await?;
        }
        self.write_register(REG_DIO_MAPPING_1, 0x00).await?;
        // The last packet always starts at the RX-current address, no need
        // to reset the FIFO pointer here
        self.set_mode(OpMode::RxContinuous).await
    }

    /// Poll for a received packet. Returns true when one is ready to be read
    /// with [`read_payload`](Sx127x::read_payload).
    pub async fn received_packet(&mut self, size: u8) -> Result<bool, Sx127xError> {
        let flags = self.irq_flags().await?;
        self.set_implicit_header(size > 0).await?;
        if size > 0 {
            self.write_register(REG_PAYLOAD_LENGTH, size).await?;
        }
        self.check_rx_flags(flags).await
    }

    /// Wait for DIO0 to report RX-done, bounded by `timeout`, then read the
    /// payload into `buf`. Returns None when the event was not a clean
    /// packet (CRC error, timeout flag); single reception is re-armed.
    pub async fn wait_packet(
        &mut self,
        timeout: Duration,
        buf: &mut [u8],
    ) -> Result<Option<usize>, Sx127xError> {
        M::wait_rx_done(&mut self.dio0, timeout).await?;
        let flags = self.irq_flags().await?;
        if self.check_rx_flags(flags).await? {
            let len = self.read_payload(buf).await?;
            Ok(Some(len))
        } else {
            Ok(None)
        }
    }

    /// Shared core of the polling and DIO0 paths: a packet is ready only
    /// when RX-done is the sole flag raised. On anything else the FIFO
    /// pointer is reset and single reception re-armed, unless the chip is
    /// already in that mode.
    async fn check_rx_flags(&mut self, flags: IrqFlags) -> Result<bool, Sx127xError> {
        if flags.rx_done_only() {
            return Ok(true);
        }
        let mode = self.read_register(REG_OP_MODE).await?;
        if mode != OpMode::RxSingle.value() {
            self.write_register(REG_FIFO_ADDR_PTR, FIFO_RX_BASE_ADDR)
                .await?;
            self.set_mode(OpMode::RxSingle).await?;
        }
        Ok(false)
    }

    /// RSSI of the last packet received, in dBm
    pub async fn packet_rssi(&mut self) -> Result<i16, Sx127xError> {
        let raw = self.read_register(REG_PKT_RSSI_VALUE).await? as i16;
        let offset = if self.frequency < RF_MID_BAND_THRESHOLD {
            164
        } else {
            157
        };
        Ok(raw - offset)
    }

    /// SNR of the last packet received, in dB
    pub async fn packet_snr(&mut self) -> Result<f32, Sx127xError> {
        let raw = self.read_register(REG_PKT_SNR_VALUE).await?;
        Ok((raw as i8) as f32 * 0.25)
    }
}
