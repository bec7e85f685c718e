pub mod artifact;
pub mod gateway;

pub use artifact::ContractArtifact;
pub use gateway::{
    classify_write_error, AccountApproval, AutoApprove, ContractGateway, EthereumGateway,
    ReadMethod, TerminalApproval, WriteMethod, WriteReceipt,
};
