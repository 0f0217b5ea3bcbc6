//! # FIFO payload transfer
//!
//! The SX127x exposes one 256-byte data buffer shared between TX and RX,
//! accessed one byte at a time through the FIFO port register. The chip
//! auto-increments its address pointer on every access, so the pointer must
//! be explicitly positioned before each multi-byte transfer.
//!
//! ## Available Methods
//!
//! - [`write_payload`](Sx127x::write_payload) - Append payload bytes before a TX
//! - [`read_payload`](Sx127x::read_payload) - Pull the received payload after RX-done

use embedded_hal::digital::v2::OutputPin;
use embedded_hal_async::spi::SpiBus;

use super::regs::*;
use super::{DioPin, Sx127x, Sx127xError};

impl<O, SPI, M> Sx127x<O, SPI, M>
where
    O: OutputPin,
    SPI: SpiBus<u8>,
    M: DioPin,
{
    /// Append payload bytes into the FIFO between
    /// [`begin_packet`](Sx127x::begin_packet) and
    /// [`end_packet`](Sx127x::end_packet). The buffer is truncated to the
    /// remaining FIFO space; callers must check the returned count.
    pub async fn write_payload(&mut self, buffer: &[u8]) -> Result<usize, Sx127xError> {
        let current = self.read_register(REG_PAYLOAD_LENGTH).await? as usize;
        let space = MAX_PKT_LENGTH - FIFO_TX_BASE_ADDR as usize - current;
        let size = buffer.len().min(space);

        for &byte in &buffer[..size] {
            self.write_register(REG_FIFO, byte).await?;
        }

        self.write_register(REG_PAYLOAD_LENGTH, (current + size) as u8)
            .await?;
        Ok(size)
    }

    /// Read the last received payload into `buf` and return its length.
    /// The length comes from the chip in explicit header mode and from the
    /// configured fixed size in implicit mode.
    pub async fn read_payload(&mut self, buf: &mut [u8]) -> Result<usize, Sx127xError> {
        // The packet sits at the RX-current address, position the pointer there
        let rx_addr = self.read_register(REG_FIFO_RX_CURRENT_ADDR).await?;
        self.write_register(REG_FIFO_ADDR_PTR, rx_addr).await?;

        let len_reg = if self.implicit_header_mode() {
            REG_PAYLOAD_LENGTH
        } else {
            REG_RX_NB_BYTES
        };
        let length = self.read_register(len_reg).await? as usize;
        if length > buf.len() {
            return Err(Sx127xError::InvalidSize);
        }

        for slot in buf[..length].iter_mut() {
            *slot = self.read_register(REG_FIFO).await?;
        }
        Ok(length)
    }
}
