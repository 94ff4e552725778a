mod order_service;
