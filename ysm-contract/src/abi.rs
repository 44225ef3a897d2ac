//! Contract ABI.
#![allow(missing_docs)]

alloy::sol! {
    /// Subset of the name-service contract used by the client.
    interface IDomains {
        function getAllNames() external view returns (string[] memory);
        function records(string name) external view returns (string memory);
        function domains(string name) external view returns (address);
        function register(string name) external payable;
        function setRecord(string name, string record) external;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::sol_types::SolCall;

    #[test]
    fn test_selectors() {
        // keccak256("register(string)")[..4]
        assert_eq!(hex::encode(IDomains::registerCall::SELECTOR), "f2c298be");
        assert_eq!(IDomains::setRecordCall::SIGNATURE, "setRecord(string,string)");
        assert_eq!(IDomains::getAllNamesCall::SIGNATURE, "getAllNames()");
    }
}
