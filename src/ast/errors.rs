use thiserror::Error;

/**********************************************\
|* Converting between rust values and Values  *|
\**********************************************/
#[derive(Error, Debug)]
pub enum InternalError {
    #[error(
        "Can't convert builtin type '{builtin_type}' to rust type '{rust_type}'"
    )]
    Conversion {
        builtin_type: String,
        rust_type: String,
    },

    #[error("Expression '{expression}' is not a value.")]
    NotAValue { expression: String },

    #[error("The session this value was defined in has ended.")]
    SessionEnded,
}

/*************************\
|* Capability resolution *|
\*************************/
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CapabilityError {
    #[error("capability '{name}' is already declared with different operations")]
    Duplicate { name: String },

    #[error("no capability named '{0}' has been declared")]
    UnknownCapability(String),

    #[error("'{operation}' is not an operation of capability '{capability}'")]
    UnknownOperation {
        capability: String,
        operation: String,
    },

    #[error("no implementation of {capability}/{operation} for type {type_name}")]
    NoImplementation {
        capability: String,
        operation: String,
        type_name: String,
    },
}

pub type CResult<T> = Result<T, CapabilityError>;

/**************\
|* Evaluation *|
\**************/
#[derive(Error, Debug)]
pub enum EvalError {
    #[error(transparent)]
    Internal(#[from] InternalError),

    #[error(transparent)]
    Capability(#[from] CapabilityError),

    #[error("syntax error: expected {expected}, got {actual}")]
    Syntax { expected: String, actual: String },

    #[error("type error: expected {expected}, got {actual}")]
    Type { expected: String, actual: String },

    #[error("Could not find symbol '{0}'")]
    LookupError(String),

    #[error("First item in S-expr is not callable: '{0}'")]
    NotCallable(String),

    #[error(
        "Function {name} takes {arity} arguments but got {num_args_provided}"
    )]
    Arity {
        name: String,
        arity: usize,
        num_args_provided: usize,
    },

    #[error("{type_name} has no field '{field}'")]
    UnknownField { type_name: String, field: String },

    #[error("{operation} is not supported by {type_name}")]
    Unsupported {
        operation: String,
        type_name: String,
    },
}

pub type EResult<T> = Result<T, EvalError>;
