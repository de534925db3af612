use crate::{
    ast::{Node, Result},
    Target,
};

pub mod js;

pub struct Compiler;

impl Compiler {
    pub fn compile(target: Target, ast: &Node) -> Result<String> {
        match target {
            Target::Js => js::compile(ast),
        }
    }
}
