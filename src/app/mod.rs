mod hwinfo;
mod net;
mod ota;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::{Delay, Duration, Timer};
use esp_hal::timer::timg::TimerGroup;
use log::{error, info, warn};
use mender_netup::{
    bring_up,
    config::{BringUpConfig, LOG_LEVEL},
    ota::{identity_from_interface, start_ota_client, OtaClientConfig},
    NetInterface, ReadinessGate,
};

use self::{hwinfo::EfuseChipId, net::events::EventDispatcher, ota::ConsoleOtaClient};

#[cfg(not(feature = "wifi"))]
type Link = net::w5500::W5500Link;
#[cfg(feature = "wifi")]
type Link = net::wifi::WifiLink;

#[cfg(feature = "wifi")]
const WIFI_HEAP_BYTES: usize = 72 * 1024;
const IDLE_LOG_INTERVAL_SECONDS: u64 = 300;

static NET_EVENTS: EventDispatcher = EventDispatcher::new();
static READINESS: ReadinessGate<CriticalSectionRawMutex> = ReadinessGate::new();

pub(crate) fn run() -> ! {
    let peripherals = esp_hal::init(esp_hal::Config::default());
    esp_println::logger::init_logger(LOG_LEVEL);
    #[cfg(feature = "wifi")]
    esp_alloc::heap_allocator!(size: WIFI_HEAP_BYTES);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    #[cfg(not(feature = "wifi"))]
    let (link, runtime) = {
        use esp_hal::{
            gpio::{Input, InputConfig, Level, Output, OutputConfig, Pull},
            spi::{
                master::{Config as SpiConfig, Spi},
                Mode as SpiMode,
            },
            time::Rate,
        };

        let spi_cfg = SpiConfig::default()
            .with_frequency(Rate::from_mhz(net::w5500::SPI_FREQUENCY_MHZ))
            .with_mode(SpiMode::_0);
        let spi = match Spi::new(peripherals.SPI2, spi_cfg) {
            Ok(spi) => spi
                .with_sck(peripherals.GPIO18)
                .with_mosi(peripherals.GPIO23)
                .with_miso(peripherals.GPIO19)
                .into_async(),
            Err(err) => {
                error!("app: failed to init SPI2 for w5500 err={:?}", err);
                halt_forever();
            }
        };

        let hw = net::w5500::W5500Hw {
            spi,
            cs: Output::new(peripherals.GPIO5, Level::High, OutputConfig::default()),
            int: Input::new(
                peripherals.GPIO4,
                InputConfig::default().with_pull(Pull::Up),
            ),
            rst: Output::new(peripherals.GPIO16, Level::High, OutputConfig::default()),
        };
        match net::w5500::setup(hw) {
            Ok(parts) => parts,
            Err(err) => {
                error!("app: w5500 setup failed err={}", err);
                halt_forever();
            }
        }
    };

    #[cfg(feature = "wifi")]
    let (link, runtime) = match net::wifi::setup(peripherals.WIFI) {
        Ok(parts) => parts,
        Err(err) => {
            error!("app: wifi setup failed err={}", err);
            halt_forever();
        }
    };

    let mut executor = esp_rtos::embassy::Executor::new();
    let executor = unsafe { make_static(&mut executor) };
    executor.run(move |spawner| {
        net::spawn_link_tasks(&spawner, runtime, &NET_EVENTS);
        spawner.must_spawn(bring_up_task(link));
    });
}

#[embassy_executor::task]
async fn bring_up_task(mut link: Link) {
    let config = BringUpConfig::from_env();
    let mut chip_id = EfuseChipId;
    let mut delay = Delay;

    match bring_up(
        &mut link,
        &mut chip_id,
        &NET_EVENTS,
        &READINESS,
        &config,
        &mut delay,
    )
    .await
    {
        Ok(report) => {
            if !report.identity.is_derived() {
                warn!("app: running with fallback identity mac={}", report.link_address);
            }
            let identity = identity_from_interface(&link);
            let mut client = ConsoleOtaClient;
            if let Err(err) = start_ota_client(&mut client, &OtaClientConfig::from_env(), &identity)
            {
                error!("app: ota hand-off failed err={}", err);
            }
        }
        Err(err) => error!("app: bring-up failed err={}", err),
    }

    loop {
        Timer::after(Duration::from_secs(IDLE_LOG_INTERVAL_SECONDS)).await;
        info!(
            "app: alive iface={} ipv4={:?}",
            link.index(),
            link.ipv4_address()
        );
    }
}

unsafe fn make_static<T>(value: &mut T) -> &'static mut T {
    unsafe { core::mem::transmute(value) }
}

fn halt_forever() -> ! {
    loop {
        core::hint::spin_loop();
    }
}
