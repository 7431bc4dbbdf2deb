pub mod mock_connection;
