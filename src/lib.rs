use clap::{builder::PossibleValue, ValueEnum};

pub mod ast;
pub mod compiler;

#[derive(Clone, Debug, Copy)]
pub enum Target {
    Js,
}

impl ValueEnum for Target {
    fn value_variants<'a>() -> &'a [Self] {
        &[Target::Js]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        match self {
            Target::Js => Some(PossibleValue::new("js")),
        }
    }
}
