//! Compiled-in ABIs for the Permit2, router and pool factory calls made by the workflows.
use alloy_sol_types::sol;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    struct PermitDetails {
        address token;
        uint160 amount;
        uint48 expiration;
        uint48 nonce;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct PermitBatch {
        PermitDetails[] details;
        address spender;
        uint256 sigDeadline;
    }

    /// EIP-2612 permit forwarded by the router. The workflows never populate it.
    #[derive(Debug, PartialEq, Eq)]
    struct PermitApproval {
        address token;
        address owner;
        address spender;
        uint256 amount;
        uint256 nonce;
        uint256 deadline;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct TokenConfig {
        address token;
        uint8 tokenType;
        address rateProvider;
        bool paysYieldFees;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct PoolRoleAccounts {
        address pauseManager;
        address swapFeeManager;
        address poolCreator;
    }

    interface IERC20 {
        function allowance(address owner, address spender) external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function decimals() external view returns (uint8);
        function approve(address spender, uint256 amount) external returns (bool);
    }

    interface IPermit2 {
        function allowance(address owner, address token, address spender)
            external
            view
            returns (uint160 amount, uint48 expiration, uint48 nonce);

        function approve(address token, address spender, uint160 amount, uint48 expiration)
            external;
    }

    /// Implemented by weighted and stable pools.
    interface IPoolInfo {
        function getTokens() external view returns (address[] memory tokens);
    }

    interface IRouter {
        function initialize(
            address pool,
            address[] memory tokens,
            uint256[] memory exactAmountsIn,
            uint256 minBptAmountOut,
            bool wethIsEth,
            bytes memory userData
        ) external payable returns (uint256 bptAmountOut);

        function addLiquidityProportional(
            address pool,
            uint256[] memory maxAmountsIn,
            uint256 exactBptAmountOut,
            bool wethIsEth,
            bytes memory userData
        ) external payable returns (uint256[] memory amountsIn);

        function queryAddLiquidityProportional(
            address pool,
            uint256 exactBptAmountOut,
            address sender,
            bytes memory userData
        ) external returns (uint256[] memory amountsIn);

        function swapSingleTokenExactIn(
            address pool,
            address tokenIn,
            address tokenOut,
            uint256 exactAmountIn,
            uint256 minAmountOut,
            uint256 deadline,
            bool wethIsEth,
            bytes memory userData
        ) external payable returns (uint256 amountOut);

        function permitBatchAndCall(
            PermitApproval[] memory permitBatch,
            bytes[] memory permitSignatures,
            PermitBatch memory permit2Batch,
            bytes memory permit2Signature,
            bytes[] memory multicallData
        ) external payable returns (bytes[] memory results);
    }

    interface IWeightedPoolFactory {
        function create(
            string memory name,
            string memory symbol,
            TokenConfig[] memory tokens,
            uint256[] memory normalizedWeights,
            PoolRoleAccounts memory roleAccounts,
            uint256 swapFeePercentage,
            address poolHooksContract,
            bool enableDonation,
            bool disableUnbalancedLiquidity,
            bytes32 salt
        ) external returns (address pool);
    }

    interface IStablePoolFactory {
        function create(
            string memory name,
            string memory symbol,
            TokenConfig[] memory tokens,
            uint256 amplificationParameter,
            PoolRoleAccounts memory roleAccounts,
            uint256 swapFeePercentage,
            address poolHooksContract,
            bool enableDonation,
            bool disableUnbalancedLiquidity,
            bytes32 salt
        ) external returns (address pool);
    }

    interface IBasePoolFactory {
        event PoolCreated(address indexed pool);
    }
}
