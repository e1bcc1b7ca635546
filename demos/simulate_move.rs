//! Simulated move on the host.
//!
//! Demonstrates how to:
//! - Describe a motor in TOML and connect it through the engine
//! - Drive the compare interrupt from a virtual timer
//! - Watch the ramp move through its states while `manage_steppers` refills
//!   the queue
//!
//! Run with: `cargo run --example simulate_move`

use stepper_pulse::{
    parse_config, Gpio, OutputPinBank, PinMode, PulseEvent, PulseTimer, RampState, Result,
    StepQueue, StepperEngine, StepperHal,
};

const CONFIG: &str = r#"
[platform]
kind = "host"

[motors.x_axis]
step_pin = 2
dir_pin = 3
enable_pin = 4
auto_enable = true
min_step_us = 500
acceleration = 4000
"#;

/// Output pin that remembers its level.
struct DemoPin {
    high: bool,
}

impl embedded_hal::digital::ErrorType for DemoPin {
    type Error = core::convert::Infallible;
}

impl embedded_hal::digital::OutputPin for DemoPin {
    fn set_low(&mut self) -> core::result::Result<(), Self::Error> {
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> core::result::Result<(), Self::Error> {
        self.high = true;
        Ok(())
    }
}

/// Host board: GPIO through embedded-hal pins, channel starts recorded.
struct DemoBoard {
    pins: OutputPinBank<DemoPin, 4>,
    started: Vec<u8>,
    now: u32,
}

impl Gpio for DemoBoard {
    fn set_pin_mode(&mut self, pin: u8, mode: PinMode) -> Result<()> {
        self.pins.set_pin_mode(pin, mode)
    }

    fn set_pin_level(&mut self, pin: u8, high: bool) -> Result<()> {
        self.pins.set_pin_level(pin, high)
    }
}

impl StepperHal for DemoBoard {
    fn start_pulse_train(&mut self, channel: u8) {
        self.started.push(channel);
    }

    fn ticks(&self) -> u32 {
        self.now
    }
}

/// Single-channel virtual compare timer.
#[derive(Default)]
struct DemoTimer {
    now: u64,
    due: Option<u64>,
    pulses: u32,
    last_pulse: u64,
}

impl PulseTimer for DemoTimer {
    fn arm_compare_interrupt(&mut self, _channel: u8, delta_ticks: u32) {
        self.due = Some(self.now + u64::from(delta_ticks));
    }

    fn step_pulse(&mut self, _channel: u8) {
        self.pulses += 1;
        self.last_pulse = self.now;
    }

    fn write_direction(&mut self, pin: u8, high: bool) {
        println!("  dir pin {} -> {}", pin, if high { "high" } else { "low" });
    }
}

fn main() -> Result<()> {
    println!("=== Simulated Move ===\n");

    let config = parse_config(CONFIG)?;
    let pins: OutputPinBank<DemoPin, 4> = OutputPinBank::new()
        .with_pin(2, DemoPin { high: false })?
        .with_pin(3, DemoPin { high: false })?
        .with_pin(4, DemoPin { high: false })?;
    let board = DemoBoard {
        pins,
        started: Vec::new(),
        now: 0,
    };

    let mut queues: [StepQueue<32>; 2] = [StepQueue::new(), StepQueue::new()];
    let (mut engine, mut pulses) = StepperEngine::new(config.platform(), board, &mut queues);
    let id = engine.connect_named(&config, "x_axis")?;

    {
        let mut stepper = engine.try_stepper(id)?;
        stepper.move_to(2000)?;
        let profile = *stepper.profile();
        println!(
            "Planned {} steps: {} accelerating, {} coasting, {} decelerating",
            profile.total_steps, profile.accel_steps, profile.coast_steps, profile.decel_steps
        );
        println!(
            "Estimated duration: {:.3} s\n",
            profile.estimated_duration_secs(2000.0, 4000.0)
        );
    }

    let mut timer = DemoTimer::default();
    let mut last_state = RampState::Idle;
    loop {
        engine.manage_steppers()?;

        let board = engine.hal_mut();
        if !board.started.is_empty() && timer.due.is_none() {
            timer.due = Some(timer.now);
        }
        board.started.clear();

        let stepper = engine.try_stepper(id)?;
        let state = stepper.ramp_state();
        if state != last_state {
            println!(
                "t = {:>8.4} s  pos = {:>5}  {}",
                timer.now as f64 / 16e6,
                stepper.current_position(),
                state
            );
            last_state = state;
        }

        let Some(at) = timer.due.take() else { break };
        timer.now = at;
        if pulses.on_compare_interrupt(&mut timer, id.channel()) == PulseEvent::Starved {
            println!("  queue drained after {} pulses", timer.pulses);
        }
        engine.hal_mut().now = at as u32;
    }

    let stepper = engine.try_stepper(id)?;
    println!("\nFinal position: {}", stepper.current_position());
    println!("Last pulse at {:.4} s", timer.last_pulse as f64 / 16e6);

    // auto-enable released the driver (active low) once idle
    let enable_high = engine.hal_mut().pins.pin_mut(4).map_or(false, |p| p.high);
    println!("Enable pin: {}", if enable_high { "high (driver off)" } else { "low (driver on)" });

    Ok(())
}
