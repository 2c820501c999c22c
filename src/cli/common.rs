//! Shared clap helper types for CLI commands.

use cardforge::{CardSide, HorizontalAlign};
use clap::ValueEnum;

/// Card side selector.
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum SideArg {
    Front,
    Back,
}

impl From<SideArg> for CardSide {
    fn from(value: SideArg) -> CardSide {
        match value {
            SideArg::Front => CardSide::Front,
            SideArg::Back => CardSide::Rear,
        }
    }
}

/// Horizontal alignment override for ad-hoc layout runs.
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum AlignArg {
    Left,
    Right,
    Center,
    Block,
}

impl From<AlignArg> for HorizontalAlign {
    fn from(value: AlignArg) -> HorizontalAlign {
        match value {
            AlignArg::Left => HorizontalAlign::Left,
            AlignArg::Right => HorizontalAlign::Right,
            AlignArg::Center => HorizontalAlign::Center,
            AlignArg::Block => HorizontalAlign::Block,
        }
    }
}
