//! `antennaflow prompt`: Show the prompt a request would produce.

use antennaflow_agent::parser;

pub fn run(request: &str, request_id: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let design = parser::parse(request);
    println!("{}", parser::build_prompt(&design, request_id));
    Ok(())
}
