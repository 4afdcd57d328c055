#![deny(unsafe_code)]
#![deny(warnings)]
#![no_main]
#![no_std]

extern crate panic_semihosting;
extern crate nb;

use core::{
	convert::Infallible,
	fmt::{ self, Write },
};

use embedded_nrf24l01::{
    Configuration, CrcMode, DataRate, NRF24L01, StandbyMode, TxMode
};

use stm32f1xx_hal::{
    prelude::*,
    delay::Delay,
    gpio::{ 
        Alternate, Floating, Input, Output, PushPull, State,
        gpioa::{ PA5, PA6, PA7 },
        gpiob::{ 
            PB12, // LED 
            PB0, // CE
            PB1 // CSN
        },
    },
    serial::{ Config, Rx, Serial, Tx },
    spi::{ self, Mode, Phase, Polarity, Spi, Spi1NoRemap },
    stm32::{ SPI1, USART1 },
};

use bridge_protocol::{
    Bridge, BridgeConfig, ConfigError, Packet, RadioConfig, Transmit, FREQUENCY, SERIAL_BAUD, TX_ADDRESS,
};

type RadioCe = PB0<Output<PushPull>>;
type RadioCsn = PB1<Output<PushPull>>;

type RadioSpi = Spi<SPI1, Spi1NoRemap, 
    (PA5<Alternate<PushPull>>, 
     PA6<Input<Floating>>, 
     PA7<Alternate<PushPull>>)>;

type Radio = NRF24L01<Infallible, RadioCe, RadioCsn, RadioSpi>;
type RadioError = embedded_nrf24l01::Error<spi::Error>;

type SerialBridge = Bridge<Rx<USART1>, Nrf24, Tx<USART1>>;

#[derive(Debug)]
pub enum TransmitError {
    /// No acknowledgement after every automatic retransmit.
    MaxRetries,
    Radio(RadioError),
}

impl fmt::Display for TransmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransmitError::MaxRetries => f.write_str("no acknowledgement"),
            TransmitError::Radio(e) => write!(f, "radio error {:?}", e),
        }
    }
}

#[derive(Debug)]
pub enum InitStatus {
    RadioConfigInvalid(ConfigError),
    RadioInitFailed(RadioError),
}

impl fmt::Display for InitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitStatus::RadioConfigInvalid(e) => write!(f, "bad radio config, {}", e),
            InitStatus::RadioInitFailed(e) => write!(f, "INIT failed, {:?}", e),
        }
    }
}

/// The radio, kept in TX mode, and an LED toggled for every packet it gets through.
pub struct Nrf24 {
    tx: TxMode<Radio>,
    led: PB12<Output<PushPull>>,
}

impl Transmit for Nrf24 {
    type Error = TransmitError;

    fn transmit(&mut self, packet: &Packet) -> Result<(), Self::Error> {
        self.tx.send(packet.as_ref()).map_err(TransmitError::Radio)?;
        match nb::block!(self.tx.poll_send()) {
            Ok(true) => {
                let _ = self.led.toggle();
                Ok(())
            },
            Ok(false) => {
                // don't leave it in the FIFO to go out with the next one
                self.tx.flush_tx().map_err(TransmitError::Radio)?;
                Err(TransmitError::MaxRetries)
            },
            Err(e) => Err(TransmitError::Radio(e)),
        }
    }
}

fn start_radio(mut radio: StandbyMode<Radio>, config: &RadioConfig) -> Result<TxMode<Radio>, RadioError> {
    radio.set_frequency(config.channel)?;
    radio.set_rf(&DataRate::R1Mbps, 3)?;
    radio.set_crc(CrcMode::OneByte)?;
    radio.set_auto_retransmit(5, 15)?;
    radio.set_pipes_rx_lengths(&config.pipe_lengths())?;
    radio.set_tx_addr(&config.address)?;
    // acknowledgements come back on pipe 0
    radio.set_rx_addr(0, &config.address)?;
    radio.tx().map_err(|(_, e)| e)
}

#[rtic::app(device = stm32f1xx_hal::pac, peripherals=true)]
const APP: () = {
    struct Resources {
        bridge: Option<SerialBridge>,
        delay: Delay,
    }

    #[init]
    fn init(cx: init::Context) -> init::LateResources {
        // Take ownership over the raw flash and rcc devices and convert them into the corresponding
        // HAL structs
        let mut flash = cx.device.FLASH.constrain();
        let mut rcc = cx.device.RCC.constrain();

        // Freeze the configuration of all the clocks in the system and store the frozen frequencies in
        // `clocks`
        let clocks = rcc.cfgr.use_hse(8.mhz()).sysclk(72.mhz()).pclk1(36.mhz()).freeze(&mut flash.acr);

        // Prepare the alternate function I/O registers
        let mut afio = cx.device.AFIO.constrain(&mut rcc.apb2);

        let mut gpioa = cx.device.GPIOA.split(&mut rcc.apb2);
        let mut gpiob = cx.device.GPIOB.split(&mut rcc.apb2);
        let led = gpiob.pb12.into_push_pull_output_with_state(&mut gpiob.crh, State::Low);

        let serial_pins = (
            gpioa.pa9.into_alternate_push_pull(&mut gpioa.crh),
            gpioa.pa10,
        );

        let serial = Serial::usart1(
            cx.device.USART1,
            serial_pins,
            &mut afio.mapr,
            Config::default().baudrate(SERIAL_BAUD.bps()),
            clocks,
            &mut rcc.apb2,
        );
        let (mut console, source) = serial.split();

        let ce = gpiob.pb0.into_push_pull_output(&mut gpiob.crl);
        let csn = gpiob.pb1.into_push_pull_output(&mut gpiob.crl);

        let spi_pins = (
            gpioa.pa5.into_alternate_push_pull(&mut gpioa.crl),
            gpioa.pa6.into_floating_input(&mut gpioa.crl),
            gpioa.pa7.into_alternate_push_pull(&mut gpioa.crl),
        );

        let spi_mode = Mode {
            polarity: Polarity::IdleLow,
            phase: Phase::CaptureOnFirstTransition
        };
        
        let spi = Spi::spi1(
            cx.device.SPI1,
            spi_pins,
            &mut afio.mapr,
            spi_mode,
            1.mhz(),
            clocks,
            &mut rcc.apb2
        );

        let radio = RadioConfig::new(FREQUENCY, TX_ADDRESS)
            .map_err(InitStatus::RadioConfigInvalid)
            .and_then(|config| {
                NRF24L01::new(ce, csn, spi)
                    .and_then(|standby| start_radio(standby, &config))
                    .map_err(InitStatus::RadioInitFailed)
            });

        let bridge = match radio {
            Ok(tx) => {
                let _ = writeln!(console, "NRF24L01 UART Bridge initialized");
                let _ = writeln!(console, "Waiting for UART data...");
                Some(Bridge::new(source, Nrf24 { tx, led }, console, BridgeConfig::default()))
            },
            Err(status) => {
                let _ = writeln!(console, "Radio not started: {}", status);
                None
            }
        };

        init::LateResources {
            bridge,
            delay: Delay::new(cx.core.SYST, clocks),
        }
    }

    #[idle(resources = [ bridge, delay ])]
    fn idle(cx: idle::Context) -> ! {
        match cx.resources.bridge.take() {
            Some(mut bridge) => bridge.run(cx.resources.delay),
            None => loop {
                cortex_m::asm::wfi();
            },
        }
    }
};
