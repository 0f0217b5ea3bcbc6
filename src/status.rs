//! # IRQ flags
//!
//! The SX127x reports TX/RX events through a single IRQ-flags register.
//! Reading the register leaves the bits untouched; clearing them requires
//! writing the same bits back (write 1 to clear). The [`IrqFlags`] structure
//! wraps a snapshot of the register and exposes one accessor per flag, plus
//! the exact-match check used to accept a packet, see
//! [`received_packet`](crate::Sx127x::received_packet).

/// Payload transmission completed
pub const IRQ_MASK_TX_DONE: u8 = 0x08;
/// Payload received with a wrong CRC
pub const IRQ_MASK_CRC_ERROR: u8 = 0x20;
/// Packet reception completed
pub const IRQ_MASK_RX_DONE: u8 = 0x40;
/// Single reception ended without detecting a packet
pub const IRQ_MASK_RX_TIMEOUT: u8 = 0x80;

/// Snapshot of the IRQ-flags register
#[derive(Default, Clone, Copy)]
pub struct IrqFlags(u8);

impl IrqFlags {
    /// Create a flag set from a raw register value
    pub fn new(value: u8) -> IrqFlags {
        IrqFlags(value)
    }

    /// Return the raw register value
    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn none(&self) -> bool {
        self.0 == 0
    }

    /// Returns true if the TX-done flag is raised
    pub fn tx_done(&self) -> bool {
        (self.0 & IRQ_MASK_TX_DONE) != 0
    }

    /// Returns true if the RX-done flag is raised
    pub fn rx_done(&self) -> bool {
        (self.0 & IRQ_MASK_RX_DONE) != 0
    }

    /// Returns true if the payload CRC error flag is raised
    pub fn crc_error(&self) -> bool {
        (self.0 & IRQ_MASK_CRC_ERROR) != 0
    }

    /// Returns true if the RX timeout flag is raised
    pub fn rx_timeout(&self) -> bool {
        (self.0 & IRQ_MASK_RX_TIMEOUT) != 0
    }

    /// Returns true when RX-done is the only flag raised. A reception with a
    /// simultaneous CRC error or timeout is never reported as a packet:
    /// dropped frames are preferred over corrupted payloads.
    pub fn rx_done_only(&self) -> bool {
        self.0 == IRQ_MASK_RX_DONE
    }
}

impl From<u8> for IrqFlags {
    fn from(value: u8) -> Self {
        IrqFlags::new(value)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for IrqFlags {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "IrqFlags: ");
        if self.none() {
            defmt::write!(f, "None");
            return;
        }
        if self.tx_done() {
            defmt::write!(f, "TxDone ")
        };
        if self.rx_done() {
            defmt::write!(f, "RxDone ")
        };
        if self.crc_error() {
            defmt::write!(f, "CrcError ")
        };
        if self.rx_timeout() {
            defmt::write!(f, "RxTimeout")
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rx_done_only_is_exact() {
        assert!(IrqFlags::new(IRQ_MASK_RX_DONE).rx_done_only());
        // RX-done with a CRC error or timeout alongside is not a packet
        let crc = IrqFlags::new(IRQ_MASK_RX_DONE | IRQ_MASK_CRC_ERROR);
        assert!(crc.rx_done() && crc.crc_error() && !crc.rx_done_only());
        let timeout = IrqFlags::new(IRQ_MASK_RX_DONE | IRQ_MASK_RX_TIMEOUT);
        assert!(!timeout.rx_done_only());
    }

    #[test]
    fn flag_accessors() {
        let flags = IrqFlags::new(IRQ_MASK_TX_DONE | IRQ_MASK_CRC_ERROR);
        assert!(flags.tx_done());
        assert!(flags.crc_error());
        assert!(!flags.rx_done());
        assert!(!flags.none());
        assert_eq!(flags.value(), 0x28);
    }
}
