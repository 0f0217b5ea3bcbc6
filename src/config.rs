//! # Radio configuration API
//!
//! This module provides the [`ModemConfig`] parameter set and the setters
//! translating it into register bit patterns. Parameters are pushed to the
//! chip once by [`init`](Sx127x::init) and can be updated individually
//! afterwards; each setter re-encodes and rewrites only the affected register
//! bits. Spreading factor and coding rate are clamped into the chip-valid
//! ranges rather than rejected.
//!
//! ## Available Methods
//!
//! - [`init`](Sx127x::init) - Probe the chip and push a full configuration
//! - [`set_frequency`](Sx127x::set_frequency) - Set the RF carrier (Hz)
//! - [`set_signal_bandwidth`](Sx127x::set_signal_bandwidth) - Select a bandwidth bin (Hz)
//! - [`set_spreading_factor`](Sx127x::set_spreading_factor) - SF6 to SF12
//! - [`set_coding_rate`](Sx127x::set_coding_rate) - Denominator 5 to 8 (4/5 to 4/8)
//! - [`set_preamble_length`](Sx127x::set_preamble_length) - Preamble symbols
//! - [`set_sync_word`](Sx127x::set_sync_word) - 0x12 private, 0x34 public network
//! - [`set_crc`](Sx127x::set_crc) - Payload CRC on/off
//! - [`set_invert_iq`](Sx127x::set_invert_iq) - IQ polarity, both registers paired
//! - [`set_tx_power`](Sx127x::set_tx_power) - Output power on RFO or PA_BOOST
//! - [`set_implicit_header`](Sx127x::set_implicit_header) - Header mode (shadowed)

use embedded_hal::digital::v2::OutputPin;
use embedded_hal_async::spi::SpiBus;

use super::regs::*;
use super::{DioPin, Sx127x, Sx127xError};

/// Radio parameters, established at driver initialization
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModemConfig {
    /// RF carrier frequency in Hz
    pub frequency: u32,
    /// Signal bandwidth in Hz, mapped onto the chip's discrete bins
    pub signal_bandwidth: u32,
    /// Spreading factor, clamped to 6..=12
    pub spreading_factor: u8,
    /// Coding rate denominator, clamped to 5..=8
    pub coding_rate: u8,
    /// Preamble length in symbols
    pub preamble_length: u16,
    /// Sync word (0x12 private network, 0x34 public)
    pub sync_word: u8,
    /// Append and check a payload CRC
    pub enable_crc: bool,
    /// Invert the IQ polarity (for talking to gateways)
    pub invert_iq: bool,
    /// Implicit (fixed length) header mode
    pub implicit_header: bool,
    /// TX output power in dBm
    pub tx_power_level: i8,
    /// TX output path
    pub pa_output: PaOutput,
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self {
            frequency: 869_525_000,
            signal_bandwidth: 125_000,
            spreading_factor: 9,
            coding_rate: 5,
            preamble_length: 8,
            sync_word: 0x12,
            enable_crc: true,
            invert_iq: false,
            implicit_header: false,
            tx_power_level: 14,
            pa_output: PaOutput::PaBoost,
        }
    }
}

impl<O, SPI, M> Sx127x<O, SPI, M>
where
    O: OutputPin,
    SPI: SpiBus<u8>,
    M: DioPin,
{
    /// Probe the chip identity and push the full configuration.
    /// Returns the chip version byte on success.
    pub async fn init(&mut self, config: &ModemConfig) -> Result<u8, Sx127xError> {
        self.implicit_header = None;

        let version = self.probe_version().await?;
        if version != VERSION_SX127X {
            return Err(Sx127xError::BadVersion(version));
        }

        // Sleep also latches the long-range (LoRa) mode bit
        self.sleep().await?;
        self.set_frequency(config.frequency).await?;
        self.set_signal_bandwidth(config.signal_bandwidth).await?;

        // LNA boost and auto AGC
        let lna = self.read_register(REG_LNA).await?;
        self.write_register(REG_LNA, lna | 0x03).await?;
        self.write_register(REG_MODEM_CONFIG_3, 0x04).await?;

        self.set_tx_power(config.tx_power_level, config.pa_output)
            .await?;
        self.set_implicit_header(config.implicit_header).await?;
        self.set_spreading_factor(config.spreading_factor).await?;
        self.set_coding_rate(config.coding_rate).await?;
        self.set_preamble_length(config.preamble_length).await?;
        self.set_sync_word(config.sync_word).await?;
        self.set_crc(config.enable_crc).await?;
        self.set_invert_iq(config.invert_iq).await?;

        // Mandatory below 62.5 bit/s: symbol period over 16ms
        if low_data_rate_optimize(config.signal_bandwidth, config.spreading_factor) {
            let cfg3 = self.read_register(REG_MODEM_CONFIG_3).await?;
            self.write_register(REG_MODEM_CONFIG_3, cfg3 | 0x08).await?;
        }

        // TX and RX share the FIFO, used at different times (half-duplex)
        self.write_register(REG_FIFO_TX_BASE_ADDR, FIFO_TX_BASE_ADDR)
            .await?;
        self.write_register(REG_FIFO_RX_BASE_ADDR, FIFO_RX_BASE_ADDR)
            .await?;

        self.standby().await?;
        Ok(version)
    }

    /// Set the RF carrier frequency (in Hz)
    pub async fn set_frequency(&mut self, freq: u32) -> Result<(), Sx127xError> {
        self.frequency = freq;
        let frf = frf_bytes(freq);
        self.write_register(REG_FRF_MSB, frf[0]).await?;
        self.write_register(REG_FRF_MID, frf[1]).await?;
        self.write_register(REG_FRF_LSB, frf[2]).await
    }

    /// Select the bandwidth bin for a requested bandwidth in Hz.
    /// Values below 10 are taken directly as a bin index.
    pub async fn set_signal_bandwidth(&mut self, bw_hz: u32) -> Result<(), Sx127xError> {
        let bin = bandwidth_bin(bw_hz);
        let cfg1 = self.read_register(REG_MODEM_CONFIG_1).await?;
        self.write_register(REG_MODEM_CONFIG_1, bandwidth_field(cfg1, bin))
            .await
    }

    /// Set the spreading factor, clamped to 6..=12.
    /// SF6 switches the detection registers to their fast preset.
    pub async fn set_spreading_factor(&mut self, sf: u8) -> Result<(), Sx127xError> {
        let sf = sf.clamp(6, 12);
        let (opt, thr) = detection_presets(sf);
        self.write_register(REG_DETECTION_OPTIMIZE, opt).await?;
        self.write_register(REG_DETECTION_THRESHOLD, thr).await?;
        let cfg2 = self.read_register(REG_MODEM_CONFIG_2).await?;
        self.write_register(REG_MODEM_CONFIG_2, spreading_factor_field(cfg2, sf))
            .await
    }

    /// Set the coding rate denominator, clamped to 5..=8 (4/5 to 4/8)
    pub async fn set_coding_rate(&mut self, denominator: u8) -> Result<(), Sx127xError> {
        let cfg1 = self.read_register(REG_MODEM_CONFIG_1).await?;
        self.write_register(REG_MODEM_CONFIG_1, coding_rate_field(cfg1, denominator))
            .await
    }

    /// Set the preamble length in symbols
    pub async fn set_preamble_length(&mut self, length: u16) -> Result<(), Sx127xError> {
        self.write_register(REG_PREAMBLE_MSB, (length >> 8) as u8)
            .await?;
        self.write_register(REG_PREAMBLE_LSB, length as u8).await
    }

    /// Set the sync word: 0x12 for a private network, 0x34 for public
    pub async fn set_sync_word(&mut self, sync_word: u8) -> Result<(), Sx127xError> {
        self.write_register(REG_SYNC_WORD, sync_word).await
    }

    /// Enable/disable the payload CRC
    pub async fn set_crc(&mut self, enable: bool) -> Result<(), Sx127xError> {
        let cfg2 = self.read_register(REG_MODEM_CONFIG_2).await?;
        self.write_register(REG_MODEM_CONFIG_2, crc_field(cfg2, enable))
            .await
    }

    /// Set the IQ polarity. The primary register carries one RX and one TX
    /// bit and the companion register must mirror a fixed constant per state;
    /// both are always written together, a partial update leaves the radio
    /// unable to talk to a symmetric peer.
    pub async fn set_invert_iq(&mut self, invert: bool) -> Result<(), Sx127xError> {
        let (bits, iq2) = invert_iq_values(invert);
        let reg = self.read_register(REG_INVERTIQ).await?;
        self.write_register(REG_INVERTIQ, (reg & INVERTIQ_TX_MASK & INVERTIQ_RX_MASK) | bits)
            .await?;
        self.write_register(REG_INVERTIQ2, iq2).await
    }

    /// Set the TX output power in dBm on the selected output path.
    /// RFO clamps to 0..=14, PA_BOOST to 2..=17.
    pub async fn set_tx_power(&mut self, level: i8, output: PaOutput) -> Result<(), Sx127xError> {
        self.write_register(REG_PA_CONFIG, pa_config(level, output))
            .await
    }

    /// Set the header mode. The flag is shadowed driver-side to skip
    /// redundant register writes.
    pub async fn set_implicit_header(&mut self, implicit: bool) -> Result<(), Sx127xError> {
        if self.implicit_header != Some(implicit) {
            self.implicit_header = Some(implicit);
            let cfg1 = self.read_register(REG_MODEM_CONFIG_1).await?;
            self.write_register(REG_MODEM_CONFIG_1, header_mode_field(cfg1, implicit))
                .await?;
        }
        Ok(())
    }

    /// Current header mode as shadowed by the driver
    pub(crate) fn implicit_header_mode(&self) -> bool {
        self.implicit_header.unwrap_or(false)
    }
}
