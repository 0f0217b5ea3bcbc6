//! Register map and pure register-value encoders
//!
//! The SX127x is controlled through an 8-bit register file. This module holds
//! the register addresses used by the driver together with pure functions
//! translating radio parameters (frequency, bandwidth, spreading factor, ...)
//! into register bit patterns. Registers shared between several logical fields
//! are updated with the read-modify-write helpers taking the current value.

/// FIFO read/write port, auto-incrementing the FIFO address pointer
pub const REG_FIFO: u8 = 0x00;
/// Operating mode and LoRa/FSK selection
pub const REG_OP_MODE: u8 = 0x01;
/// RF carrier frequency, most significant byte
pub const REG_FRF_MSB: u8 = 0x06;
/// RF carrier frequency, middle byte
pub const REG_FRF_MID: u8 = 0x07;
/// RF carrier frequency, least significant byte
pub const REG_FRF_LSB: u8 = 0x08;
/// PA selection and output power
pub const REG_PA_CONFIG: u8 = 0x09;
/// LNA gain and boost control
pub const REG_LNA: u8 = 0x0C;
/// Address pointer in the FIFO data buffer
pub const REG_FIFO_ADDR_PTR: u8 = 0x0D;
/// Write base address in the FIFO for TX
pub const REG_FIFO_TX_BASE_ADDR: u8 = 0x0E;
/// Read base address in the FIFO for RX
pub const REG_FIFO_RX_BASE_ADDR: u8 = 0x0F;
/// Start address of the last packet received
pub const REG_FIFO_RX_CURRENT_ADDR: u8 = 0x10;
/// IRQ flags (write 1 to clear)
pub const REG_IRQ_FLAGS: u8 = 0x12;
/// Number of payload bytes of the last packet received
pub const REG_RX_NB_BYTES: u8 = 0x13;
/// SNR of the last packet received
pub const REG_PKT_SNR_VALUE: u8 = 0x19;
/// RSSI of the last packet received
pub const REG_PKT_RSSI_VALUE: u8 = 0x1A;
/// Bandwidth, coding rate and header mode
pub const REG_MODEM_CONFIG_1: u8 = 0x1D;
/// Spreading factor, CRC enable and symbol timeout MSB
pub const REG_MODEM_CONFIG_2: u8 = 0x1E;
/// Preamble length, most significant byte
pub const REG_PREAMBLE_MSB: u8 = 0x20;
/// Preamble length, least significant byte
pub const REG_PREAMBLE_LSB: u8 = 0x21;
/// Payload length (TX and implicit-header RX)
pub const REG_PAYLOAD_LENGTH: u8 = 0x22;
/// Low data rate optimize and auto AGC
pub const REG_MODEM_CONFIG_3: u8 = 0x26;
/// LoRa detection optimize
pub const REG_DETECTION_OPTIMIZE: u8 = 0x31;
/// IQ polarity for RX and TX
pub const REG_INVERTIQ: u8 = 0x33;
/// LoRa detection threshold
pub const REG_DETECTION_THRESHOLD: u8 = 0x37;
/// LoRa sync word
pub const REG_SYNC_WORD: u8 = 0x39;
/// Companion register of the IQ polarity, must mirror the IQ state
pub const REG_INVERTIQ2: u8 = 0x3B;
/// DIO0..DIO3 function mapping
pub const REG_DIO_MAPPING_1: u8 = 0x40;
/// Chip silicon revision
pub const REG_VERSION: u8 = 0x42;

/// Bit 7 of the op-mode register: LoRa long range mode
pub const MODE_LONG_RANGE: u8 = 0x80;
/// PA_BOOST output selection in the PA configuration register
pub const PA_BOOST: u8 = 0x80;

/// RegInvertiq RX polarity mask/bits
pub const INVERTIQ_RX_MASK: u8 = 0xBF;
pub const INVERTIQ_RX_ON: u8 = 0x40;
pub const INVERTIQ_RX_OFF: u8 = 0x00;
/// RegInvertiq TX polarity mask/bits
pub const INVERTIQ_TX_MASK: u8 = 0xFE;
pub const INVERTIQ_TX_ON: u8 = 0x00;
pub const INVERTIQ_TX_OFF: u8 = 0x01;
/// RegInvertiq2 values paired with the primary register
pub const INVERTIQ2_ON: u8 = 0x19;
pub const INVERTIQ2_OFF: u8 = 0x1D;

/// Silicon revision reported by the SX1276/77/78/79
pub const VERSION_SX127X: u8 = 0x12;

/// FIFO size shared between TX and RX (half-duplex)
pub const MAX_PKT_LENGTH: usize = 255;
/// Write base address in the FIFO for TX
pub const FIFO_TX_BASE_ADDR: u8 = 0x00;
/// Read base address in the FIFO for RX
pub const FIFO_RX_BASE_ADDR: u8 = 0x00;

/// Crystal frequency (Hz) feeding the frequency synthesizer
pub const FXOSC: u64 = 32_000_000;

/// Boundary between the LF and HF port of the SX1276, used for the RSSI offset
pub const RF_MID_BAND_THRESHOLD: u32 = 525_000_000;

/// The 9 discrete bandwidth bins (Hz), index 0 to 8. Index 9 selects 500 kHz.
pub const BANDWIDTH_HZ: [u32; 9] = [
    7_800, 10_400, 15_600, 20_800, 31_250, 41_700, 62_500, 125_000, 250_000,
];

/// TX power output path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PaOutput {
    /// RFO pin, 0 to 14 dBm
    Rfo,
    /// PA_BOOST pin, 2 to 17 dBm
    PaBoost,
}

/// Encode a carrier frequency into the three FRF register bytes (MSB first)
/// Resolution is FXOSC / 2^19, about 61 Hz. Integer floor, no rounding.
pub fn frf_bytes(freq_hz: u32) -> [u8; 3] {
    let frf = ((freq_hz as u64) << 19) / FXOSC;
    [(frf >> 16) as u8, (frf >> 8) as u8, frf as u8]
}

/// Inverse of [`frf_bytes`]: carrier frequency encoded by three FRF bytes
pub fn frf_to_hz(frf: [u8; 3]) -> u32 {
    let steps = ((frf[0] as u64) << 16) | ((frf[1] as u64) << 8) | (frf[2] as u64);
    ((steps * FXOSC) >> 19) as u32
}

/// Select the bandwidth bin for a requested bandwidth in Hz: the first bin
/// whose value is at least the request, 9 (500 kHz) when above all bins.
/// Inputs below 10 are taken directly as a bin index.
pub fn bandwidth_bin(bw_hz: u32) -> u8 {
    if bw_hz < 10 {
        return bw_hz as u8;
    }
    for (bin, hz) in BANDWIDTH_HZ.iter().enumerate() {
        if bw_hz <= *hz {
            return bin as u8;
        }
    }
    9
}

/// Merge a bandwidth bin into the high nibble of ModemConfig1
pub fn bandwidth_field(cfg1: u8, bin: u8) -> u8 {
    (cfg1 & 0x0F) | (bin << 4)
}

/// Merge a coding rate denominator (clamped to 5..=8) into bits 3:1 of ModemConfig1
pub fn coding_rate_field(cfg1: u8, denominator: u8) -> u8 {
    let cr = denominator.clamp(5, 8) - 4;
    (cfg1 & 0xF1) | (cr << 1)
}

/// Set or clear the implicit-header bit of ModemConfig1
pub fn header_mode_field(cfg1: u8, implicit: bool) -> u8 {
    if implicit { cfg1 | 0x01 } else { cfg1 & 0xFE }
}

/// Merge a spreading factor (clamped to 6..=12) into the high nibble of ModemConfig2
pub fn spreading_factor_field(cfg2: u8, sf: u8) -> u8 {
    let sf = sf.clamp(6, 12);
    (cfg2 & 0x0F) | (sf << 4)
}

/// Set or clear the CRC enable bit of ModemConfig2
pub fn crc_field(cfg2: u8, enable: bool) -> u8 {
    if enable { cfg2 | 0x04 } else { cfg2 & 0xFB }
}

/// Detection optimize and detection threshold presets: SF6 uses a dedicated
/// fast-detection preset, SF7 to SF12 share one
pub fn detection_presets(sf: u8) -> (u8, u8) {
    if sf == 6 { (0xC5, 0x0C) } else { (0xC3, 0x0A) }
}

/// Bits to OR into the masked RegInvertiq value, and the paired RegInvertiq2
/// value. Both registers must always be written together.
pub fn invert_iq_values(invert: bool) -> (u8, u8) {
    if invert {
        (INVERTIQ_RX_ON | INVERTIQ_TX_ON, INVERTIQ2_ON)
    } else {
        (INVERTIQ_RX_OFF | INVERTIQ_TX_OFF, INVERTIQ2_OFF)
    }
}

/// PA configuration byte for a power level on the selected output path.
/// RFO clamps to 0..=14 dBm, PA_BOOST to 2..=17 dBm.
pub fn pa_config(level: i8, output: PaOutput) -> u8 {
    match output {
        PaOutput::Rfo => 0x70 | level.clamp(0, 14) as u8,
        PaOutput::PaBoost => PA_BOOST | (level.clamp(2, 17) as u8 - 2),
    }
}

/// The chip requires the low-data-rate-optimize bit whenever the symbol
/// period 2^sf / bw exceeds 16 ms. The request is resolved to its bin first
/// so that raw bin indices get judged on the bin's actual bandwidth.
pub fn low_data_rate_optimize(bw_hz: u32, sf: u8) -> bool {
    let bin = bandwidth_bin(bw_hz) as usize;
    let hz = BANDWIDTH_HZ.get(bin).copied().unwrap_or(500_000);
    (1000u32 << sf.clamp(6, 12)) / hz > 16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frf_round_trip() {
        // One step of the synthesizer is FXOSC / 2^19, just above 61 Hz
        for mhz in 137..=1020u32 {
            for freq in [mhz * 1_000_000, mhz * 1_000_000 + 500_000] {
                let back = frf_to_hz(frf_bytes(freq));
                assert!(freq - back < 62, "freq {freq} decoded as {back}");
            }
        }
    }

    #[test]
    fn bandwidth_bin_monotonic() {
        let mut last = 0;
        for bw in (1_000..300_000u32).step_by(100) {
            let bin = bandwidth_bin(bw);
            assert!(bin >= last, "bin went down at {bw} Hz");
            last = bin;
        }
    }

    #[test]
    fn bandwidth_bin_selection() {
        assert_eq!(bandwidth_bin(125_000), 7);
        assert_eq!(bandwidth_bin(125_001), 8);
        assert_eq!(bandwidth_bin(250_000), 8);
        assert_eq!(bandwidth_bin(500_000), 9);
        // Raw-index escape hatch
        assert_eq!(bandwidth_bin(3), 3);
    }

    #[test]
    fn spreading_factor_clamps() {
        assert_eq!(spreading_factor_field(0x00, 0) >> 4, 6);
        assert_eq!(spreading_factor_field(0x00, 100) >> 4, 12);
        assert_eq!(spreading_factor_field(0x0F, 9), 0x9F);
    }

    #[test]
    fn coding_rate_clamps() {
        assert_eq!(coding_rate_field(0x00, 0), 1 << 1);
        assert_eq!(coding_rate_field(0x00, 100), 4 << 1);
        // Bits outside 3:1 are preserved
        assert_eq!(coding_rate_field(0xF1, 5), 0xF1 | (1 << 1));
    }

    #[test]
    fn invert_iq_always_paired() {
        assert_eq!(invert_iq_values(true), (0x40, 0x19));
        assert_eq!(invert_iq_values(false), (0x01, 0x1D));
    }

    #[test]
    fn pa_config_paths() {
        assert_eq!(pa_config(20, PaOutput::PaBoost), 0x80 | 15);
        assert_eq!(pa_config(2, PaOutput::PaBoost), 0x80);
        assert_eq!(pa_config(-5, PaOutput::Rfo), 0x70);
        assert_eq!(pa_config(14, PaOutput::Rfo), 0x7E);
    }

    #[test]
    fn ldro_threshold() {
        // SF9 at 125 kHz: 4 ms symbols, no optimization
        assert!(!low_data_rate_optimize(125_000, 9));
        // SF12 at 7.8 kHz: half-second symbols
        assert!(low_data_rate_optimize(7_800, 12));
        assert!(low_data_rate_optimize(125_000, 12));
    }

    #[test]
    fn ldro_accepts_raw_bin_indices() {
        // Raw index 0 means the 7.8 kHz bin, not a 0 Hz bandwidth
        assert!(low_data_rate_optimize(0, 12));
        assert!(!low_data_rate_optimize(0, 6));
        // Raw index 8 is the 250 kHz bin: 16.4 ms symbols at SF12, at the
        // threshold but not over it
        assert!(!low_data_rate_optimize(8, 12));
        // Index 9 selects 500 kHz
        assert!(!low_data_rate_optimize(9, 12));
    }
}
