use std::fmt;

use crate::error::ParseError;

/// The resource a finished restore job created, identified from its ARN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoredResource {
    DynamoDbTable { table_name: String },
    Ec2,
    Other(String),
}

impl RestoredResource {
    /// `arn:aws:dynamodb:us-east-1:123456789012:table/orders-restore-test`
    pub fn from_arn(arn: &str) -> Result<Self, ParseError> {
        let segments: Vec<&str> = arn.split(':').collect();

        let service = segments.get(2).ok_or_else(|| ParseError::MalformedArn {
            arn: arn.to_string(),
            reason: "no service segment",
        })?;

        match *service {
            "dynamodb" => {
                let table_name = segments
                    .get(5)
                    .and_then(|resource| resource.split('/').nth(1))
                    .ok_or_else(|| ParseError::MalformedArn {
                        arn: arn.to_string(),
                        reason: "no table/<name> resource segment",
                    })?;

                Ok(Self::DynamoDbTable {
                    table_name: table_name.to_string(),
                })
            }
            "ec2" => Ok(Self::Ec2),
            other => Ok(Self::Other(other.to_string())),
        }
    }

    /// The ARN service segment, as reported in the confirmation message.
    pub fn service(&self) -> &str {
        match self {
            Self::DynamoDbTable { .. } => "dynamodb",
            Self::Ec2 => "ec2",
            Self::Other(service) => service,
        }
    }
}

impl fmt::Display for RestoredResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DynamoDbTable { table_name } => write!(f, "dynamodb table {}", table_name),
            other => write!(f, "{} resource", other.service()),
        }
    }
}
