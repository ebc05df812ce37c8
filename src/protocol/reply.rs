use std::str::FromStr;

use nom::branch::alt;
use nom::bytes::complete::{is_not, take_while1};
use nom::character::complete::{char, digit1, space0, space1};
use nom::combinator::{map_res, opt, rest, value};
use nom::multi::many0;
use nom::sequence::{preceded, terminated};
use nom::{IResult, Parser};

use crate::error::ClientError;
use crate::protocol::strip_terminator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
	Success,
	Failure,
	Event,
}

/// Structured view of a server line: `[id ]<sign>COMMAND [args...] [: trailing]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
	pub id: Option<u32>,
	pub sign: Option<Sign>,
	pub command: String,
	pub arguments: Vec<String>,
	pub trailing: Option<String>,
}

impl Reply {
	/// Command name, upper cased for matching
	pub fn command_upper(&self) -> String {
		self.command.to_uppercase()
	}

	pub fn is(&self, sign: Sign, command: &str) -> bool {
		self.sign == Some(sign) && self.command.eq_ignore_ascii_case(command)
	}
}

fn request_id(input: &str) -> IResult<&str, u32> {
	map_res(digit1, str::parse::<u32>).parse(input)
}

fn sign(input: &str) -> IResult<&str, Sign> {
	alt((
		value(Sign::Success, char('+')),
		value(Sign::Failure, char('-')),
		value(Sign::Event, char('$')),
	))
	.parse(input)
}

fn command(input: &str) -> IResult<&str, &str> {
	take_while1(|c: char| c.is_alphanumeric() || c == '_').parse(input)
}

fn arguments(input: &str) -> IResult<&str, Vec<&str>> {
	many0(preceded(space1, is_not(" \t:"))).parse(input)
}

fn trailing(input: &str) -> IResult<&str, &str> {
	preceded((space0, char(':'), space0), rest).parse(input)
}

fn reply(input: &str) -> IResult<&str, Reply> {
	// A leading number is a request id only when a space follows it
	let (input, id) = opt(terminated(request_id, space1)).parse(input)?;
	let (input, sign) = opt(sign).parse(input)?;
	let (input, command) = command(input)?;
	let (input, arguments) = arguments(input)?;
	let (input, trailing) = opt(trailing).parse(input)?;

	Ok((
		input,
		Reply {
			id,
			sign,
			command: command.to_string(),
			arguments: arguments.into_iter().map(String::from).collect(),
			trailing: trailing.map(String::from),
		},
	))
}

impl FromStr for Reply {
	type Err = ClientError;

	fn from_str(line: &str) -> Result<Self, Self::Err> {
		reply(strip_terminator(line))
			.map(|(_, reply)| reply)
			.map_err(|e| ClientError::Protocol(format!("unparsable line {:?}: {}", line, e)))
	}
}
