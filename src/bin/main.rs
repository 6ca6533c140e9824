// pool-timer entry point
//
// Boot sequence: logger -> HAL -> RTOS -> timer pool -> keypad
// Tasks: timer service (runs every timer callback), keypad (edges and
// expiries -> key events). The main task just reports key events.
//
// All timers come from one StaticCell'd pool; nothing is heap allocated.

#![no_std]
#![no_main]

use embassy_executor::Spawner;
use esp_backtrace as _;
use esp_hal::clock::CpuClock;
use esp_hal::interrupt::software::SoftwareInterruptControl;
use esp_hal::timer::timg::TimerGroup;
use log::info;
use static_cell::StaticCell;

use pool_timer::TimerPool;
use pool_timer::board::{self, BoardPool, KeypadHw};
use pool_timer::driver::TimerService;
use pool_timer::kernel::{KEY_EVENTS, keypad_task, timer_service_task};

esp_bootloader_esp_idf::esp_app_desc!();

static POOL: StaticCell<BoardPool> = StaticCell::new();

#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    esp_println::logger::init_logger_from_env();
    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    let sw_int = SoftwareInterruptControl::new(peripherals.SW_INTERRUPT);
    esp_rtos::start(timg0.timer0, sw_int.software_interrupt0);
    info!("booting...");

    let pool: &'static BoardPool = POOL.init(TimerPool::new(TimerService::new()));
    spawner.spawn(timer_service_task(pool).unwrap());
    info!("timer service ready.");

    let hw = KeypadHw::new(peripherals.GPIO9, peripherals.GPIO5, peripherals.GPIO6);
    let keypad = board::keypad(pool, hw).unwrap();
    spawner.spawn(keypad_task(keypad).unwrap());
    info!(
        "keypad ready, {} of {} timers in use.",
        pool.len(),
        pool.capacity()
    );

    loop {
        let event = KEY_EVENTS.receive().await;
        info!("key: {} at {}us", event, pool.current_time());
    }
}
