//! Shared types used across the drivers
//!
//! Pin identities and the electrical settings written into the GPIO
//! configuration registers. Each setting carries its register encoding so
//! drivers never deal in bare numbers.

use core::fmt;

/// GPIO port identifier (A–H on the STM32F446RE)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Port {
    /// GPIOA
    A,
    /// GPIOB
    B,
    /// GPIOC
    C,
    /// GPIOD
    D,
    /// GPIOE
    E,
    /// GPIOF
    F,
    /// GPIOG
    G,
    /// GPIOH
    H,
}

impl Port {
    /// All ports in address order
    pub const ALL: [Self; 8] = [
        Self::A,
        Self::B,
        Self::C,
        Self::D,
        Self::E,
        Self::F,
        Self::G,
        Self::H,
    ];

    /// Zero-based port number (A = 0)
    #[must_use]
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Port letter
    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
            Self::D => 'D',
            Self::E => 'E',
            Self::F => 'F',
            Self::G => 'G',
            Self::H => 'H',
        }
    }

    /// Build a pin on this port, `None` if `index` is 16 or more
    #[must_use]
    pub const fn pin(self, index: u8) -> Option<Pin> {
        Pin::new(self, index)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Port {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "GPIO{}", self.letter());
    }
}

/// Pin identity: a port and an index below 16
///
/// The index bound is checked at construction, so every shift derived from
/// a `Pin` stays inside its 32-bit register.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pin {
    port: Port,
    index: u8,
}

impl Pin {
    /// Number of pins per port
    pub const PER_PORT: u8 = 16;

    /// Create a pin, returns None if `index` is out of range
    #[must_use]
    pub const fn new(port: Port, index: u8) -> Option<Self> {
        if index < Self::PER_PORT {
            Some(Self { port, index })
        } else {
            None
        }
    }

    /// Parse a pin name such as `"PC8"` or `"pa15"`
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let bytes = name.as_bytes();
        if bytes.len() < 3 || !bytes[0].eq_ignore_ascii_case(&b'P') {
            return None;
        }
        let port = match bytes[1].to_ascii_uppercase() {
            b'A' => Port::A,
            b'B' => Port::B,
            b'C' => Port::C,
            b'D' => Port::D,
            b'E' => Port::E,
            b'F' => Port::F,
            b'G' => Port::G,
            b'H' => Port::H,
            _ => return None,
        };
        let index = match bytes[2..] {
            [d] if d.is_ascii_digit() => d - b'0',
            [t, d] if (b'1'..=b'9').contains(&t) && d.is_ascii_digit() => (t - b'0') * 10 + (d - b'0'),
            _ => return None,
        };
        Self::new(port, index)
    }

    /// Port this pin belongs to
    #[must_use]
    pub const fn port(self) -> Port {
        self.port
    }

    /// Index within the port (0–15)
    #[must_use]
    pub const fn index(self) -> u8 {
        self.index
    }

    /// Single-bit mask in a 1-bit-per-pin register (ODR, IDR, OTYPER)
    #[must_use]
    pub const fn mask(self) -> u32 {
        1 << self.index
    }
}

impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}{}", self.port.letter(), self.index)
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Pin {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "P{}{}", self.port.letter(), self.index);
    }
}

/// Logic level of a pin
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Level {
    /// Driven or read low
    #[default]
    Low,
    /// Driven or read high
    High,
}

impl Level {
    /// Opposite level
    #[must_use]
    pub const fn toggle(self) -> Self {
        match self {
            Self::Low => Self::High,
            Self::High => Self::Low,
        }
    }

    /// Level from a register bit
    #[must_use]
    pub const fn from_bit(bit: bool) -> Self {
        if bit {
            Self::High
        } else {
            Self::Low
        }
    }

    /// True for `High`
    #[must_use]
    pub const fn is_high(self) -> bool {
        matches!(self, Self::High)
    }
}

impl From<bool> for Level {
    fn from(bit: bool) -> Self {
        Self::from_bit(bit)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Level {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Low => defmt::write!(f, "LOW"),
            Self::High => defmt::write!(f, "HIGH"),
        }
    }
}

/// Pin mode (MODER, 2 bits per pin)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
pub enum Mode {
    /// Digital input
    #[default]
    Input,
    /// General-purpose output
    Output,
    /// Routed to a peripheral signal
    AlternateFunction,
    /// Analog
    Analog,
}

impl Mode {
    /// Register encoding
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::Input => 0b00,
            Self::Output => 0b01,
            Self::AlternateFunction => 0b10,
            Self::Analog => 0b11,
        }
    }

    /// Decode a 2-bit field
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0b00 => Self::Input,
            0b01 => Self::Output,
            0b10 => Self::AlternateFunction,
            _ => Self::Analog,
        }
    }
}

/// Output driver type (OTYPER, 1 bit per pin)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
pub enum OutputType {
    /// Push-pull
    #[default]
    PushPull,
    /// Open-drain
    OpenDrain,
}

impl OutputType {
    /// Register encoding
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::PushPull => 0,
            Self::OpenDrain => 1,
        }
    }

    /// Decode a 1-bit field
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        if bits & 1 == 0 {
            Self::PushPull
        } else {
            Self::OpenDrain
        }
    }
}

/// Output slew rate (OSPEEDR, 2 bits per pin)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
pub enum Speed {
    /// Low speed
    #[default]
    Low,
    /// Medium speed
    Medium,
    /// Fast speed
    Fast,
    /// High speed
    High,
}

impl Speed {
    /// Register encoding
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::Low => 0b00,
            Self::Medium => 0b01,
            Self::Fast => 0b10,
            Self::High => 0b11,
        }
    }

    /// Decode a 2-bit field
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0b00 => Self::Low,
            0b01 => Self::Medium,
            0b10 => Self::Fast,
            _ => Self::High,
        }
    }
}

/// Pull resistor (PUPDR, 2 bits per pin)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
pub enum Pull {
    /// Floating
    #[default]
    None,
    /// Pull-up
    Up,
    /// Pull-down
    Down,
}

impl Pull {
    /// Register encoding
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::None => 0b00,
            Self::Up => 0b01,
            Self::Down => 0b10,
        }
    }

    /// Decode a 2-bit field; the reserved `0b11` reads as `None`
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0b01 => Self::Up,
            0b10 => Self::Down,
            _ => Self::None,
        }
    }
}

/// Alternate-function selector (AF0–AF15)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct AltFunction(u8);

impl AltFunction {
    /// AF1: TIM1/TIM2
    pub const AF1: Self = Self(1);
    /// AF2: TIM3/TIM4/TIM5
    pub const AF2: Self = Self(2);
    /// AF7: USART1/USART2/USART3
    pub const AF7: Self = Self(7);
    /// AF8: UART4/UART5/USART6
    pub const AF8: Self = Self(8);

    /// Create a selector, returns None above 15
    #[must_use]
    pub const fn new(index: u8) -> Option<Self> {
        if index <= 15 {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Selector value written into AFRL/AFRH
    #[must_use]
    pub const fn index(self) -> u8 {
        self.0
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for AltFunction {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "AF{}", self.0);
    }
}

/// Complete electrical configuration of one pin
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
pub struct PinConfig {
    /// Pin mode
    pub mode: Mode,
    /// Output driver type
    pub output_type: OutputType,
    /// Output speed
    pub speed: Speed,
    /// Pull resistor
    pub pull: Pull,
    /// Alternate function, only meaningful in `Mode::AlternateFunction`
    pub alternate: AltFunction,
}

impl PinConfig {
    /// Push-pull output, low speed, no pull
    #[must_use]
    pub const fn output() -> Self {
        Self {
            mode: Mode::Output,
            output_type: OutputType::PushPull,
            speed: Speed::Low,
            pull: Pull::None,
            alternate: AltFunction(0),
        }
    }

    /// Floating input
    #[must_use]
    pub const fn input(pull: Pull) -> Self {
        Self {
            mode: Mode::Input,
            output_type: OutputType::PushPull,
            speed: Speed::Low,
            pull,
            alternate: AltFunction(0),
        }
    }

    /// Settings forced by `set_alternate_function`
    #[must_use]
    pub const fn alternate(af: AltFunction) -> Self {
        Self {
            mode: Mode::AlternateFunction,
            output_type: OutputType::PushPull,
            speed: Speed::High,
            pull: Pull::None,
            alternate: af,
        }
    }
}
